//! Joins: explicit conditions, foreign keys, validation and outer join
//! mapping.

mod common;

use common::{siesta, Contract, Manufacturer, Part, Salesperson};
use tessera_core::{count, Error, ExpressionExt, ForeignKeyJoin, SqlValue, ValueRow};
use tessera_derive::Table;

#[allow(dead_code)]
#[derive(Debug, Clone, PartialEq, Table)]
pub struct Region {
    #[column(primary_key)]
    country: String,
    #[column(primary_key)]
    code: String,
    name: String,
}

#[allow(dead_code)]
#[derive(Debug, Clone, PartialEq, Table)]
pub struct Office {
    #[column(primary_key)]
    id: i64,
    #[column(references = "Region::country")]
    country: String,
    #[column(references = "Region::code")]
    region_code: String,
}

#[test]
fn test_self_join_on_surname() {
    let db = siesta();
    let s1 = db.alias::<Salesperson>("s1");
    let s2 = db.alias::<Salesperson>("s2");
    let select = db
        .from(&s1)
        .join(&s2)
        .on(s2.col(Salesperson::surname()).eq(s1.col(Salesperson::surname())))
        .select(s1.col(Salesperson::first_name()))
        .comma(s2.col(Salesperson::first_name()))
        .build()
        .unwrap();

    assert_eq!(
        select.sql().unwrap(),
        "select s1.FIRST_NAME as s1_FIRST_NAME, s2.FIRST_NAME as s2_FIRST_NAME \
         from SIESTA.SALESPERSON s1 join SIESTA.SALESPERSON s2 on s2.SURNAME = s1.SURNAME"
    );
    assert!(select.args().unwrap().is_empty());
}

#[test]
fn test_join_condition_chain() {
    let db = siesta();
    let s1 = db.alias::<Salesperson>("s1");
    let s2 = db.alias::<Salesperson>("s2");
    let select = db
        .from(&s1)
        .join(&s2)
        .on(s2.col(Salesperson::surname()).eq(s1.col(Salesperson::surname())))
        .and(s2.col(Salesperson::id()).ne(s1.col(Salesperson::id())))
        .select(s2.col(Salesperson::id()))
        .build()
        .unwrap();

    assert_eq!(
        select.sql().unwrap(),
        "select s2.ID as s2_ID from SIESTA.SALESPERSON s1 join SIESTA.SALESPERSON s2 \
         on s2.SURNAME = s1.SURNAME and s2.ID <> s1.ID"
    );
}

#[test]
fn test_two_aliases_of_one_table_are_ambiguous() {
    let db = siesta();
    let s1 = db.alias::<Salesperson>("s1");
    let s2 = db.alias::<Salesperson>("s2");
    let builder = db
        .from(&s1)
        .join(&s2)
        .on(s2.col(Salesperson::surname()).eq(s1.col(Salesperson::surname())));

    assert!(matches!(
        builder.scope().find_alias::<Salesperson>(None),
        Err(Error::AmbiguousAlias(_))
    ));
    assert_eq!(
        builder
            .scope()
            .find_alias::<Salesperson>(Some("s2"))
            .unwrap()
            .name(),
        "s2"
    );

    let ambiguous = builder
        .select(Salesperson::first_name())
        .build()
        .unwrap();
    assert!(matches!(ambiguous.sql(), Err(Error::AmbiguousAlias(_))));
}

#[test]
fn test_named_column_reference_picks_the_alias() {
    let db = siesta();
    let s1 = db.alias::<Salesperson>("s1");
    let s2 = db.alias::<Salesperson>("s2");
    let select = db
        .from(&s1)
        .join(&s2)
        .on(s2.col(Salesperson::surname()).eq(s1.col(Salesperson::surname())))
        .select(Salesperson::first_name().of("s2"))
        .build()
        .unwrap();
    assert_eq!(
        select.sql().unwrap(),
        "select s2.FIRST_NAME as s2_FIRST_NAME from SIESTA.SALESPERSON s1 \
         join SIESTA.SALESPERSON s2 on s2.SURNAME = s1.SURNAME"
    );
}

#[test]
fn test_join_must_reference_the_joined_alias() {
    let db = siesta();
    let s1 = db.alias::<Salesperson>("s1");
    let s2 = db.alias::<Salesperson>("s2");

    let select = db
        .from(&s1)
        .join(&s2)
        .on(s1.col(Salesperson::id()).eq(1_i64))
        .build()
        .unwrap();
    assert!(matches!(select.sql(), Err(Error::InvalidJoin(alias)) if alias == "s2"));

    let unchecked = db
        .from(&s1)
        .join(&s2)
        .validate(false)
        .on(s1.col(Salesperson::id()).eq(1_i64))
        .select(s1.col(Salesperson::id()))
        .build()
        .unwrap();
    assert_eq!(
        unchecked.sql().unwrap(),
        "select s1.ID as s1_ID from SIESTA.SALESPERSON s1 \
         join SIESTA.SALESPERSON s2 on s1.ID = ?"
    );
    assert_eq!(unchecked.args().unwrap(), vec![SqlValue::Int(1)]);
}

#[test]
fn test_foreign_key_from_child_to_parent() {
    let db = siesta();
    let pt = db.alias::<Part>("pt");
    let m = db.alias::<Manufacturer>("m");
    let select = db
        .from(&pt)
        .join(&m)
        .on_foreign_key(ForeignKeyJoin::from::<Part>())
        .select(pt.col(Part::name()))
        .comma(m.col(Manufacturer::name()))
        .build()
        .unwrap();

    assert_eq!(
        select.sql().unwrap(),
        "select pt.NAME as pt_NAME, m.NAME as m_NAME from SIESTA.PART pt \
         join SIESTA.MANUFACTURER m on m.ID = pt.MANUFACTURER_ID"
    );
}

#[test]
fn test_left_join_from_parent_maps_missing_rows_to_none() {
    let db = siesta();
    let m = db.alias::<Manufacturer>("m");
    let pt = db.alias::<Part>("pt");
    let select = db
        .from(&m)
        .left_join(&pt)
        .on_foreign_key(ForeignKeyJoin::to::<Manufacturer>())
        .build()
        .unwrap();

    assert_eq!(
        select.sql().unwrap(),
        "select m.ID as m_ID, m.NAME as m_NAME, pt.ID as pt_ID, pt.NAME as pt_NAME, \
         pt.MANUFACTURER_ID as pt_MANUFACTURER_ID from SIESTA.MANUFACTURER m \
         left join SIESTA.PART pt on pt.MANUFACTURER_ID = m.ID"
    );

    let mapper = select.row_mapper().unwrap();
    let unmatched = ValueRow::new()
        .with("m_ID", 1_i64)
        .with("m_NAME", "Acme")
        .with("pt_ID", SqlValue::Null)
        .with("pt_NAME", SqlValue::Null)
        .with("pt_MANUFACTURER_ID", SqlValue::Null);
    let (manufacturer, part) = mapper.map_row(&unmatched).unwrap();
    assert_eq!(manufacturer.name, "Acme");
    assert_eq!(part, None);

    let matched = ValueRow::new()
        .with("m_ID", 1_i64)
        .with("m_NAME", "Acme")
        .with("pt_ID", 10_i64)
        .with("pt_NAME", "Anvil")
        .with("pt_MANUFACTURER_ID", 1_i64);
    let (_, part) = mapper.map_row(&matched).unwrap();
    assert_eq!(
        part,
        Some(Part {
            id: 10,
            name: String::from("Anvil"),
            manufacturer_id: 1,
        })
    );
}

#[test]
fn test_full_join_keyword() {
    let db = siesta();
    let m = db.alias::<Manufacturer>("m");
    let pt = db.alias::<Part>("pt");
    let select = db
        .from(&m)
        .full_join(&pt)
        .on_foreign_key(ForeignKeyJoin::to::<Manufacturer>())
        .select(m.col(Manufacturer::id()))
        .build()
        .unwrap();
    assert_eq!(
        select.sql().unwrap(),
        "select m.ID as m_ID from SIESTA.MANUFACTURER m \
         full outer join SIESTA.PART pt on pt.MANUFACTURER_ID = m.ID"
    );
}

#[test]
fn test_foreign_key_needs_a_name_when_ambiguous() {
    let db = siesta();
    let c = db.alias::<Contract>("c");
    let m = db.alias::<Manufacturer>("m");

    let err = db
        .from(&c)
        .join(&m)
        .on_foreign_key(ForeignKeyJoin::from::<Contract>())
        .build()
        .unwrap_err();
    assert!(matches!(err, Error::AmbiguousForeignKey { .. }));

    let select = db
        .from(&c)
        .join(&m)
        .on_foreign_key(ForeignKeyJoin::from::<Contract>().named("FK_SELLER"))
        .select(m.col(Manufacturer::name()))
        .build()
        .unwrap();
    assert_eq!(
        select.sql().unwrap(),
        "select m.NAME as m_NAME from SIESTA.CONTRACT c \
         join SIESTA.MANUFACTURER m on m.ID = c.SELLER_ID"
    );
}

#[test]
fn test_missing_foreign_key() {
    let db = siesta();
    let p = db.alias::<Salesperson>("p");
    let m = db.alias::<Manufacturer>("m");

    let err = db
        .from(&p)
        .join(&m)
        .on_foreign_key(ForeignKeyJoin::from::<Salesperson>())
        .build()
        .unwrap_err();
    assert!(matches!(err, Error::NoForeignKey { .. }));

    // Unvalidated joins resolve the key when rendered
    let select = db
        .from(&p)
        .join(&m)
        .validate(false)
        .on_foreign_key(ForeignKeyJoin::from::<Salesperson>())
        .build()
        .unwrap();
    assert!(matches!(select.sql(), Err(Error::NoForeignKey { .. })));
}

#[test]
fn test_join_subquery_source() {
    let db = siesta();
    let pt = db.alias::<Part>("pt");
    let m = db.alias::<Manufacturer>("m");
    let counts = db
        .from(&pt)
        .select(pt.col(Part::manufacturer_id()))
        .comma_as(count(pt.col(Part::id())), "n")
        .group_by(pt.col(Part::manufacturer_id()))
        .build()
        .unwrap();
    let c = counts.as_alias("c");

    let select = db
        .from(&m)
        .join(&c)
        .on(c.column::<i64>("pt_MANUFACTURER_ID").eq(m.col(Manufacturer::id())))
        .select(m.col(Manufacturer::name()))
        .comma(c.column::<i64>("n"))
        .build()
        .unwrap();

    assert_eq!(
        select.sql().unwrap(),
        "select m.NAME as m_NAME, c.n as c_n from SIESTA.MANUFACTURER m \
         join (select pt.MANUFACTURER_ID as pt_MANUFACTURER_ID, count(pt.ID) as n \
         from SIESTA.PART pt group by pt.MANUFACTURER_ID) c on c.pt_MANUFACTURER_ID = m.ID"
    );

    let row = ValueRow::new().with("m_NAME", "Acme").with("c_n", 3_i64);
    let (name, n): (String, i64) = select.row_mapper().unwrap().map_row(&row).unwrap();
    assert_eq!((name.as_str(), n), ("Acme", 3));
}

#[test]
fn test_foreign_key_text_does_not_depend_on_validation() {
    let db = siesta();
    let pt = db.alias::<Part>("pt");
    let m = db.alias::<Manufacturer>("m");
    let render = |validate: bool| {
        db.from(&pt)
            .join(&m)
            .validate(validate)
            .on_foreign_key(ForeignKeyJoin::from::<Part>())
            .or(m.col(Manufacturer::name()).eq("Acme"))
            .select(pt.col(Part::name()))
            .build()
            .unwrap()
            .sql()
            .unwrap()
    };

    let expected = "select pt.NAME as pt_NAME from SIESTA.PART pt \
         join SIESTA.MANUFACTURER m on m.ID = pt.MANUFACTURER_ID or m.NAME = ?";
    assert_eq!(render(true), expected);
    assert_eq!(render(false), expected);
}

#[test]
fn test_composite_foreign_key_is_parenthesized() {
    let db = siesta();
    let o = db.alias::<Office>("o");
    let r = db.alias::<Region>("r");
    let render = |validate: bool| {
        db.from(&o)
            .join(&r)
            .validate(validate)
            .on_foreign_key(ForeignKeyJoin::from::<Office>())
            .or(r.col(Region::name()).eq("Europe"))
            .select(o.col(Office::id()))
            .build()
            .unwrap()
            .sql()
            .unwrap()
    };

    let expected = "select o.ID as o_ID from SIESTA.OFFICE o join SIESTA.REGION r \
         on (r.COUNTRY = o.COUNTRY and r.CODE = o.REGION_CODE) or r.NAME = ?";
    assert_eq!(render(true), expected);
    assert_eq!(render(false), expected);
}
