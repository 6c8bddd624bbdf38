/*!
# TMDL Parser

Parsers for the text files of a semantic model definition:

- `tables/<Name>.tmdl` → [`parse_table`]
- `relationships.tmdl` → [`parse_relationships`]
- `model.tmdl` → [`parse_model_name`]

All parsers are tolerant: they never fail, unknown lines are skipped, and
input without the expected declaration degrades to `None` or an empty list.

## Usage

```rust
use pbi_model_analyzer::parser::parse_table;

let table = parse_table("table Sales\n\tmeasure 'Total Sales' = SUM(Sales[Amount])\n").unwrap();
assert_eq!(table.measures[0].expression, "SUM(Sales[Amount])");
```
*/

pub mod lines;
pub mod model_decl;
pub mod relationships;
pub mod table;

pub use lines::{indent_depth, unquote_identifier, unquote_value};
pub use model_decl::parse_model_name;
pub use relationships::{parse_relationships, split_column_ref};
pub use table::{parse_table, TableParser};
