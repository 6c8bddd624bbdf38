//! DAX Function Tables
//!
//! Списки функций DAX, используемые анализаторами сложности, шаблонов и
//! качества. Таблицы данных вместо условий в коде: правило добавляется одной
//! строкой.

use crate::dependencies::mask_bracket_names;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

/// Функции, итерирующие табличное выражение построчно
pub static ITERATOR_FUNCTIONS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    HashSet::from([
        "SUMX", "AVERAGEX", "COUNTX", "COUNTAX", "MINX", "MAXX", "PRODUCTX", "RANKX",
        "CONCATENATEX", "FILTER", "ADDCOLUMNS", "SELECTCOLUMNS", "GENERATE", "GENERATEALL",
        "TOPN", "MEDIANX", "PERCENTILEX.INC", "PERCENTILEX.EXC", "STDEVX.P", "STDEVX.S",
        "VARX.P", "VARX.S",
    ])
});

/// Функции, явно изменяющие контекст фильтра
pub static FILTER_MODIFIER_FUNCTIONS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    HashSet::from([
        "CALCULATE", "CALCULATETABLE", "ALL", "ALLEXCEPT", "ALLSELECTED", "ALLNOBLANKROW",
        "REMOVEFILTERS", "KEEPFILTERS", "USERELATIONSHIP", "CROSSFILTER", "TREATAS",
    ])
});

/// Функции операций со временем
pub static TIME_INTELLIGENCE_FUNCTIONS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    HashSet::from([
        "SAMEPERIODLASTYEAR", "DATEADD", "DATESYTD", "DATESMTD", "DATESQTD", "TOTALYTD",
        "TOTALMTD", "TOTALQTD", "PARALLELPERIOD", "PREVIOUSYEAR", "PREVIOUSMONTH",
        "PREVIOUSQUARTER", "PREVIOUSDAY", "NEXTYEAR", "NEXTMONTH", "NEXTQUARTER", "NEXTDAY",
        "DATESBETWEEN", "DATESINPERIOD", "OPENINGBALANCEYEAR", "CLOSINGBALANCEYEAR",
        "OPENINGBALANCEMONTH", "CLOSINGBALANCEMONTH", "STARTOFYEAR", "ENDOFYEAR",
        "STARTOFMONTH", "ENDOFMONTH", "FIRSTDATE", "LASTDATE",
    ])
});

/// Безопасное деление
pub static RATIO_FUNCTIONS: Lazy<HashSet<&'static str>> = Lazy::new(|| HashSet::from(["DIVIDE"]));

/// Ветвление
pub static CONDITIONAL_FUNCTIONS: Lazy<HashSet<&'static str>> =
    Lazy::new(|| HashSet::from(["IF", "SWITCH", "IF.EAGER", "COALESCE"]));

/// Агрегации
pub static AGGREGATION_FUNCTIONS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    HashSet::from([
        "SUM", "SUMX", "COUNT", "COUNTA", "COUNTAX", "COUNTX", "COUNTROWS", "COUNTBLANK",
        "DISTINCTCOUNT", "DISTINCTCOUNTNOBLANK", "AVERAGE", "AVERAGEA", "AVERAGEX", "MIN",
        "MINA", "MINX", "MAX", "MAXA", "MAXX", "MEDIAN", "MEDIANX", "PRODUCT", "PRODUCTX",
    ])
});

/// Строковые функции
pub static TEXT_FUNCTIONS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    HashSet::from([
        "CONCATENATE", "CONCATENATEX", "FORMAT", "LEFT", "RIGHT", "MID", "LEN", "UPPER",
        "LOWER", "TRIM", "SUBSTITUTE", "REPLACE", "SEARCH", "FIND", "REPT", "UNICHAR",
        "COMBINEVALUES", "FIXED", "VALUE",
    ])
});

/// Прочие распознаваемые функции (для подсчета сложности)
static OTHER_FUNCTIONS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    HashSet::from([
        "VALUES", "DISTINCT", "RELATED", "RELATEDTABLE", "LOOKUPVALUE", "SELECTEDVALUE",
        "HASONEVALUE", "HASONEFILTER", "ISFILTERED", "ISCROSSFILTERED", "ISBLANK", "ISERROR",
        "IFERROR", "BLANK", "EARLIER", "EARLIEST", "SUMMARIZE", "SUMMARIZECOLUMNS", "ROW",
        "UNION", "INTERSECT", "EXCEPT", "NATURALINNERJOIN", "NATURALLEFTOUTERJOIN",
        "CROSSJOIN", "DATATABLE", "CALENDAR", "CALENDARAUTO", "DATE", "YEAR", "MONTH", "DAY",
        "TODAY", "NOW", "EOMONTH", "EDATE", "DATEDIFF", "WEEKDAY", "WEEKNUM", "ROUND",
        "ROUNDUP", "ROUNDDOWN", "INT", "ABS", "MOD", "POWER", "SQRT", "AND", "OR", "NOT",
        "TRUE", "FALSE", "CONTAINS", "CONTAINSSTRING", "USERPRINCIPALNAME", "PATH",
        "PATHITEM", "RANK.EQ", "INDEX", "OFFSET", "WINDOW",
    ])
});

/// Все распознаваемые функции DAX
pub static DAX_FUNCTIONS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    let mut all = HashSet::new();
    for table in [
        &*ITERATOR_FUNCTIONS,
        &*FILTER_MODIFIER_FUNCTIONS,
        &*TIME_INTELLIGENCE_FUNCTIONS,
        &*RATIO_FUNCTIONS,
        &*CONDITIONAL_FUNCTIONS,
        &*AGGREGATION_FUNCTIONS,
        &*TEXT_FUNCTIONS,
        &*OTHER_FUNCTIONS,
    ] {
        all.extend(table.iter().copied());
    }
    all
});

static FUNCTION_CALL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([A-Za-z][A-Za-z0-9_.]*)\s*\(").expect("function call pattern is valid")
});

/// Имена вызываемых функций в порядке появления (в верхнем регистре).
/// Ожидает текст без строк и комментариев.
pub fn function_calls(code: &str) -> Vec<String> {
    let masked = mask_bracket_names(code);
    FUNCTION_CALL
        .captures_iter(&masked)
        .filter(|caps| caps.get(0).is_some_and(|m| !is_inside_name(&masked, m.start())))
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_ascii_uppercase())
        .collect()
}

/// The match starts inside `'...'` or continues a longer token.
/// Expects bracketed names already masked.
fn is_inside_name(masked: &str, pos: usize) -> bool {
    let before = &masked[..pos];
    if before
        .chars()
        .next_back()
        .is_some_and(|c| c.is_alphanumeric() || c == '_' || c == '.')
    {
        return true;
    }
    before.matches('\'').count() % 2 == 1
}

/// Распознанные функции из заданной таблицы (без повторов)
pub fn matching_functions(calls: &[String], table: &HashSet<&'static str>) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();
    for call in calls {
        if table.contains(call.as_str()) && !found.contains(call) {
            found.push(call.clone());
        }
    }
    found
}
