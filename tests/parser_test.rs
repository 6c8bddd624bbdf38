/*!
# Parser Integration Tests

TMDL table and relationship parsing through the public API.
*/

use pbi_model_analyzer::model::{Cardinality, Column, Measure, Table};
use pbi_model_analyzer::parser::{parse_model_name, parse_relationships, parse_table};
use pretty_assertions::assert_eq;

const SALES_TABLE: &str = "\
table Sales
\tlineageTag: 5f2c

\t/// Sum of the sales amount
\tmeasure 'Total Sales' = SUM(Sales[Amount])
\t\tformatString: \\$#,0.00
\t\tdisplayFolder: Revenue
\t\tlineageTag: 91aa

\tmeasure 'Sales LY' = ```
\t\t\tCALCULATE(
\t\t\t\t[Total Sales],

\t\t\t\tSAMEPERIODLASTYEAR('Date'[Date])
\t\t\t)
\t\t\t```
\t\tdisplayFolder: Time

\tcolumn Amount
\t\tdataType: decimal
\t\tsourceColumn: Amount
\t\tsummarizeBy: sum

\tcolumn 'Order Date'
\t\tdataType: dateTime
\t\tisHidden
\t\tsourceColumn: OrderDate

\tpartition Sales = m
\t\tmode: import
\t\tsource = let Source = Sql.Database(\"srv\", \"db\") in Source

\tannotation PBI_ResultType = Table
";

#[test]
fn test_simple_sales_table() {
    let table = parse_table("table Sales\n\tmeasure 'Total Sales' = SUM(Sales[Amount])\n\tcolumn Amount\n\t\tdataType: decimal\n")
        .expect("table");

    let mut expected = Table::new("Sales");
    expected
        .measures
        .push(Measure::new("Total Sales", "SUM(Sales[Amount])"));
    let mut amount = Column::new("Amount");
    amount.data_type = "decimal".to_string();
    expected.columns.push(amount);

    assert_eq!(table, expected);
}

#[test]
fn test_full_table() {
    let table = parse_table(SALES_TABLE).expect("table");

    assert_eq!(table.name, "Sales");
    assert_eq!(table.lineage_tag.as_deref(), Some("5f2c"));
    assert_eq!(table.annotations.len(), 1);
    assert_eq!(table.annotations[0].name, "PBI_ResultType");

    let names: Vec<&str> = table.measures.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["Total Sales", "Sales LY"]);

    let total = &table.measures[0];
    assert_eq!(total.description.as_deref(), Some("Sum of the sales amount"));
    assert_eq!(total.display_folder.as_deref(), Some("Revenue"));

    let last_year = &table.measures[1];
    assert_eq!(
        last_year.expression,
        "CALCULATE(\n\t[Total Sales],\n\n\tSAMEPERIODLASTYEAR('Date'[Date])\n)"
    );
    assert_eq!(last_year.display_folder.as_deref(), Some("Time"));

    assert_eq!(table.columns.len(), 2);
    let order_date = &table.columns[1];
    assert_eq!(order_date.name, "Order Date");
    assert!(order_date.is_hidden);
    assert_eq!(order_date.source_column.as_deref(), Some("OrderDate"));
    // partition properties never leak into the column
    assert_eq!(order_date.data_type, "dateTime");
}

#[test]
fn test_parsing_is_idempotent() {
    assert_eq!(parse_table(SALES_TABLE), parse_table(SALES_TABLE));
}

#[test]
fn test_single_trailing_measure_is_kept() {
    let table = parse_table("table Calc\n\tmeasure Answer = 42").expect("table");
    assert_eq!(table.measures.len(), 1);
    assert_eq!(table.measures[0].expression, "42");
}

#[test]
fn test_fenced_formula_round_trip() {
    let text = "table T\n\tmeasure M = ```\n\t\tVAR a = 1\n\n\n\t\tRETURN a\n\t\t```\n";
    let table = parse_table(text).expect("table");
    assert_eq!(table.measures[0].expression, "VAR a = 1\n\n\nRETURN a");
}

#[test]
fn test_relationship_without_to_column_is_dropped() {
    let text = "\
relationship broken
\tfromColumn: Sales.ProductKey

relationship 3f0a
\tfromCardinality: many
\ttoCardinality: one
\tfromColumn: Sales.DateKey
\ttoColumn: 'Date'.'Date Key'
\tcrossFilteringBehavior: bothDirections
";
    let relationships = parse_relationships(text);
    assert_eq!(relationships.len(), 1);

    let relationship = &relationships[0];
    assert_eq!(relationship.name.as_deref(), Some("3f0a"));
    assert_eq!(relationship.from_table, "Sales");
    assert_eq!(relationship.to_table, "Date");
    assert_eq!(relationship.to_column, "Date Key");
    assert_eq!(relationship.from_cardinality, Some(Cardinality::Many));
    assert_eq!(relationship.to_cardinality, Some(Cardinality::One));
    assert!(relationship.is_active);
    assert_eq!(
        relationship.cross_filtering_behavior.as_deref(),
        Some("bothDirections")
    );
}

#[test]
fn test_inactive_relationship() {
    let text = "relationship r\n\tisActive: false\n\tfromColumn: A.X\n\ttoColumn: B.Y\n";
    let relationships = parse_relationships(text);
    assert!(!relationships[0].is_active);
}

#[test]
fn test_unnamed_relationship_keeps_previous_record() {
    let text = "\
relationship a
\tfromColumn: Sales.DateKey
\ttoColumn: Date.DateKey
relationship
\tfromColumn: Sales.ProductKey
\ttoColumn: Product.ProductKey
";
    let relationships = parse_relationships(text);
    let described: Vec<(Option<&str>, String)> = relationships
        .iter()
        .map(|r| (r.name.as_deref(), r.to_string()))
        .collect();
    assert_eq!(
        described,
        vec![
            (Some("a"), "Sales[DateKey] -> Date[DateKey]".to_string()),
            (None, "Sales[ProductKey] -> Product[ProductKey]".to_string()),
        ]
    );
}

#[test]
fn test_model_name() {
    assert_eq!(
        parse_model_name("model 'Sales Model'\n\tculture: en-US\n").as_deref(),
        Some("Sales Model")
    );
    assert_eq!(parse_model_name("\n"), None);
}
