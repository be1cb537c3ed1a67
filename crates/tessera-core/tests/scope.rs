//! Alias resolution across scope frames.

mod common;

use common::{siesta, Manufacturer, Salesperson};
use std::sync::Arc;

use tessera_core::{Database, Error, ExpressionExt, Scope};

#[test]
fn test_inner_frame_shadows_outer_frame() {
    let db = siesta();
    let outer = db.alias::<Salesperson>("outer_p");
    let inner = db.alias::<Salesperson>("inner_p");
    let scope = Scope::with_aliases(&db, vec![outer.any().clone()]).plus(inner.any());

    assert!(!scope.is_outermost());
    assert_eq!(scope.find_alias::<Salesperson>(None).unwrap().name(), "inner_p");
    assert_eq!(
        scope
            .find_alias::<Salesperson>(Some("outer_p"))
            .unwrap()
            .name(),
        "outer_p"
    );
}

#[test]
fn test_one_frame_with_two_candidates_is_ambiguous() {
    let db = siesta();
    let a = db.alias::<Salesperson>("a");
    let b = db.alias::<Salesperson>("b");
    let scope = Scope::with_aliases(&db, vec![a.any().clone()]).extend(b.any());

    assert_eq!(scope.aliases().len(), 2);
    assert!(matches!(
        scope.find_alias::<Salesperson>(None),
        Err(Error::AmbiguousAlias(_))
    ));
    assert_eq!(scope.find_alias::<Salesperson>(Some("b")).unwrap(), *b.any());
}

#[test]
fn test_alias_of_another_table() {
    let db = siesta();
    let p = db.alias::<Salesperson>("p");
    let scope = Scope::with_aliases(&db, vec![p.any().clone()]);

    let err = scope.find_alias::<Manufacturer>(Some("p")).unwrap_err();
    assert!(matches!(err, Error::AliasTypeMismatch { .. }));
    assert_eq!(
        err.to_string(),
        "alias p is an alias for Salesperson and not Manufacturer"
    );

    assert!(matches!(
        scope.find_alias::<Manufacturer>(None),
        Err(Error::NoSuchAlias { .. })
    ));
}

#[test]
fn test_plus_scope_grafts_frames() {
    let db = siesta();
    let p = db.alias::<Salesperson>("p");
    let m = db.alias::<Manufacturer>("m");
    let outer = Scope::with_aliases(&db, vec![p.any().clone()]);
    let inner = Scope::with_aliases(&db, vec![m.any().clone()]);

    let scope = outer.plus_scope(&inner);
    assert_eq!(scope.aliases(), &[m.any().clone()]);
    assert_eq!(scope.find_alias_named("p").unwrap(), *p.any());
    assert_eq!(scope.find_alias_named("m").unwrap(), *m.any());
    assert!(matches!(
        scope.find_alias_named("x"),
        Err(Error::NoSuchAlias { .. })
    ));
}

#[test]
fn test_unnamed_alias_uses_table_name() {
    let db = siesta();
    let alias = db.unnamed_alias::<Manufacturer>();
    assert_eq!(alias.name(), "MANUFACTURER");
    assert!(!alias.any().is_explicit());

    let scope = Scope::new(&db).plus(alias.any());
    assert_eq!(
        scope.find_alias::<Manufacturer>(None).unwrap().name(),
        "MANUFACTURER"
    );
}

#[test]
fn test_empty_scope_keeps_database() {
    let db = siesta();
    let p = db.alias::<Salesperson>("p");
    let scope = Scope::new(&db).plus(p.any());
    let empty = scope.empty();
    assert!(empty.is_outermost());
    assert!(empty.aliases().is_empty());
    assert_eq!(empty.database().default_schema(), Some("SIESTA"));
}

#[test]
fn test_same_name_in_one_frame_is_ambiguous() {
    let db = siesta();
    let p = db.alias::<Salesperson>("x");
    let m = db.alias::<Manufacturer>("x");
    let scope = Scope::with_aliases(&db, vec![p.any().clone()]).extend(m.any());

    assert!(matches!(
        scope.find_alias::<Salesperson>(Some("x")),
        Err(Error::AmbiguousAlias(name)) if name == "x"
    ));
    assert!(matches!(
        scope.find_alias_named("x"),
        Err(Error::AmbiguousAlias(_))
    ));
}

#[test]
fn test_join_reusing_an_alias_name_fails_to_build() {
    let db = siesta();
    let p = db.alias::<Salesperson>("x");
    let m = db.alias::<Manufacturer>("x");
    let result = db
        .from(&p)
        .join(&m)
        .validate(false)
        .on(m.col(Manufacturer::id()).eq(p.col(Salesperson::id())))
        .select(p.col(Salesperson::first_name()))
        .build();

    assert!(matches!(result, Err(Error::AmbiguousAlias(name)) if name == "x"));
}

#[test]
fn test_table_metadata_is_resolved_once_per_database() {
    let db = siesta();
    let first = db.table::<Salesperson>();
    assert!(Arc::ptr_eq(&first, &db.table::<Salesperson>()));

    let other = Database::builder().default_schema("OTHER").build();
    let other_meta = other.table::<Salesperson>();
    assert!(!Arc::ptr_eq(&first, &other_meta));
    assert_eq!(other_meta.qualified_name(), "OTHER.SALESPERSON");
}
