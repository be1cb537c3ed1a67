//! Tests for the `#[derive(Table)]` macro output.

mod common;

use std::any::TypeId;

use common::{Contract, Manufacturer, Part, Salesperson, SalespersonColumns};
use tessera_core::{
    Column, Database, NamingStrategy, RowReader, Table, TableMeta, ValueRow,
};
use tessera_derive::Table;

#[allow(dead_code)]
#[derive(Debug, Clone, PartialEq, Table)]
#[table(name = "INVENTORY_ITEM", schema = "STOCK")]
pub struct Item {
    #[column(primary_key, name = "ITEM_NO")]
    pub id: i64,
    pub description: Option<String>,
    #[column(nullable)]
    pub weight: Option<f64>,
}

#[test]
fn test_table_constants() {
    assert_eq!(Salesperson::TYPE_NAME, "Salesperson");
    assert_eq!(Salesperson::NAME, None);
    assert_eq!(Salesperson::SCHEMA, None);
    let properties: Vec<&str> = Salesperson::COLUMNS.iter().map(|c| c.property).collect();
    assert_eq!(properties, vec!["id", "first_name", "surname"]);
    assert!(Salesperson::COLUMNS[0].primary_key);
    assert!(Salesperson::FOREIGN_KEYS.is_empty());
}

#[test]
fn test_explicit_names() {
    assert_eq!(Item::NAME, Some("INVENTORY_ITEM"));
    assert_eq!(Item::SCHEMA, Some("STOCK"));
    assert_eq!(Item::COLUMNS[0].name, Some("ITEM_NO"));

    let db = Database::builder().default_schema("SIESTA").build();
    let meta = TableMeta::of::<Item>(&db);
    assert_eq!(meta.qualified_name(), "STOCK.INVENTORY_ITEM");
    assert_eq!(meta.column_name_for("id").unwrap(), "ITEM_NO");
    assert_eq!(meta.column_name_for("description").unwrap(), "DESCRIPTION");
}

#[test]
fn test_option_fields_are_nullable() {
    assert!(!Item::COLUMNS[0].nullable);
    assert!(Item::COLUMNS[1].nullable);
    assert!(Item::COLUMNS[2].nullable);
}

#[test]
fn test_column_types() {
    assert_eq!(<SalespersonColumns::FirstName as Column>::PROPERTY, "first_name");
    assert_eq!(<SalespersonColumns::FirstName as Column>::NAME, None);
    const { assert!(<SalespersonColumns::Id as Column>::PRIMARY_KEY) };
    const { assert!(!<SalespersonColumns::Surname as Column>::NULLABLE) };
    assert_eq!(<ItemColumns::Id as Column>::NAME, Some("ITEM_NO"));
    assert_eq!(Salesperson::first_name().property(), "first_name");
}

#[test]
fn test_foreign_keys() {
    let [key] = Part::FOREIGN_KEYS else {
        panic!("expected one foreign key");
    };
    assert_eq!(key.name, None);
    assert_eq!(key.parent_name, "Manufacturer");
    assert_eq!((key.parent)(), TypeId::of::<Manufacturer>());
    assert_eq!(key.columns, &[("manufacturer_id", "id")]);

    let names: Vec<Option<&str>> = Contract::FOREIGN_KEYS.iter().map(|k| k.name).collect();
    assert_eq!(names, vec![Some("FK_BUYER"), Some("FK_SELLER")]);
}

#[test]
fn test_naming_strategy_applies_to_derived_tables() {
    let db = Database::builder()
        .naming_strategy(NamingStrategy::LowercaseUnderscores)
        .build();
    let meta = TableMeta::of::<Salesperson>(&db);
    assert_eq!(meta.qualified_name(), "salesperson");
    assert_eq!(meta.column_name_for("first_name").unwrap(), "first_name");
}

#[test]
fn test_from_row() {
    let row = ValueRow::new()
        .with("i_ITEM_NO", 4_i64)
        .with("i_DESCRIPTION", "Bolt")
        .with("i_WEIGHT", tessera_core::SqlValue::Null);
    let labels = [
        ("id", String::from("i_ITEM_NO")),
        ("description", String::from("i_DESCRIPTION")),
        ("weight", String::from("i_WEIGHT")),
    ];
    let item = Item::from_row(&RowReader::new(&row, &labels)).unwrap();
    assert_eq!(
        item,
        Item {
            id: 4,
            description: Some(String::from("Bolt")),
            weight: None,
        }
    );
}
