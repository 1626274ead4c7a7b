#![cfg(feature = "sqlite")]

use rowmap::sqlite::SqliteDatabase;
use rowmap::{
    field, Entity, Error, Mapping, Options, OrderBy, Parameter, Projection, SelectKind, Session,
    UpdateSet, Value,
};

#[derive(Debug, Default, Clone, PartialEq)]
struct Person {
    id: i64,
    name: String,
    email: Option<String>,
    age: i32,
    active: bool,
}

impl Entity for Person {
    fn mapping() -> Mapping<Self> {
        Mapping::<Self>::table("PEOPLE")
            .auto_key("id", "PERSON_ID", |p| &p.id, |p| &mut p.id)
            .column("name", "FULL_NAME", |p| &p.name, |p| &mut p.name)
            .field("email", |p| &p.email, |p| &mut p.email)
            .field("age", |p| &p.age, |p| &mut p.age)
            .column("active", "IS_ACTIVE", |p| &p.active, |p| &mut p.active)
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
struct Tag {
    label: String,
    weight: i32,
}

impl Entity for Tag {
    fn mapping() -> Mapping<Self> {
        Mapping::<Self>::table("TAGS")
            .field("label", |t| &t.label, |t| &mut t.label)
            .field("weight", |t| &t.weight, |t| &mut t.weight)
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
struct Contact {
    id: i64,
    address: String,
    address1: String,
}

impl Entity for Contact {
    fn mapping() -> Mapping<Self> {
        Mapping::<Self>::table("CONTACTS")
            .auto_key("id", "CONTACT_ID", |c| &c.id, |c| &mut c.id)
            .field("address", |c| &c.address, |c| &mut c.address)
            .field("address1", |c| &c.address1, |c| &mut c.address1)
    }
}

fn session() -> Session<SqliteDatabase> {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut session = Session::new(SqliteDatabase::in_memory().unwrap());
    session
        .execute_sql(
            "CREATE TABLE PEOPLE (PERSON_ID INTEGER PRIMARY KEY AUTOINCREMENT, FULL_NAME TEXT NOT NULL, \
             email TEXT, age INTEGER NOT NULL, IS_ACTIVE INTEGER NOT NULL)",
            &[],
        )
        .unwrap();
    session
        .execute_sql("CREATE TABLE TAGS (label TEXT NOT NULL, weight INTEGER NOT NULL)", &[])
        .unwrap();
    session
}

fn person(name: &str, age: i32) -> Person {
    Person {
        id: 0,
        name: name.to_string(),
        email: None,
        age,
        active: true,
    }
}

fn people(count: i32) -> Vec<Person> {
    (1..=count).map(|i| person(&format!("p{:02}", i), 20 + i)).collect()
}

#[test]
fn test_insert_and_read_back() {
    let mut session = session();
    let mut ann = person("ann", 34);
    ann.email = Some("ann@example.com".to_string());
    ann.active = false;

    let inserted = session.insert_assign(&mut ann).unwrap();
    assert_eq!(inserted.generated(), Some(&Value::I64(1)));
    assert_eq!(ann.id, 1);

    let found: Vec<Person> = session.select_where(Some(&field("id").eq(1)), None).unwrap();
    assert_eq!(found, vec![ann]);
}

#[test]
fn test_delete_then_select_is_empty() {
    let mut session = session();
    let mut bob = person("bob", 40);
    session.insert_assign(&mut bob).unwrap();

    assert_eq!(session.delete(&bob).unwrap(), 1);
    let found: Vec<Person> = session.select_where(Some(&field("id").eq(bob.id)), None).unwrap();
    assert!(found.is_empty());
}

#[test]
fn test_batches_report_affected_rows() {
    let mut session = session().with_options(Options::default().batch_size(10));
    assert_eq!(session.insert_batch(&people(25)).unwrap(), 25);
    assert_eq!(session.count::<Person>(None).unwrap(), 25);

    let mut stored: Vec<Person> = session.select_where(None, Some(&OrderBy::new().asc("id"))).unwrap();
    for p in stored.iter_mut() {
        p.active = false;
    }
    assert_eq!(session.update_batch(&stored).unwrap(), 25);
    assert!(!session.exists::<Person>(Some(&field("active").eq(true))).unwrap());

    assert_eq!(session.delete_batch(&stored[..12]).unwrap(), 12);
    assert_eq!(session.count::<Person>(None).unwrap(), 13);
}

#[test]
fn test_batch_keeps_digit_suffixed_members_apart() {
    let mut session = session();
    session
        .execute_sql(
            "CREATE TABLE CONTACTS (CONTACT_ID INTEGER PRIMARY KEY AUTOINCREMENT, address TEXT NOT NULL, \
             address1 TEXT NOT NULL)",
            &[],
        )
        .unwrap();
    let contacts: Vec<Contact> = (0..12)
        .map(|i| Contact {
            id: 0,
            address: format!("street-{}", i),
            address1: format!("apt-{}", i),
        })
        .collect();
    assert_eq!(session.insert_batch(&contacts).unwrap(), 12);

    let stored: Vec<Contact> = session
        .select_where(None, Some(&OrderBy::new().asc("id")))
        .unwrap();
    assert_eq!(stored.len(), 12);
    for (i, contact) in stored.iter().enumerate() {
        assert_eq!(contact.id, i as i64 + 1);
        assert_eq!(contact.address, format!("street-{}", i));
        assert_eq!(contact.address1, format!("apt-{}", i));
    }

    let twelfth: Vec<Contact> = session.select_where(Some(&field("id").eq(12)), None).unwrap();
    assert_eq!(twelfth[0].address, "street-11");
}

#[test]
fn test_keyless_type_rejects_keyed_writes() {
    let mut session = session();
    let tag = Tag {
        label: "rust".into(),
        weight: 3,
    };
    assert_eq!(session.insert(&tag).unwrap().affected(), 1);
    assert!(matches!(session.delete(&tag), Err(Error::KeyRequired { .. })));
    assert!(matches!(session.update(&tag), Err(Error::KeyRequired { .. })));

    let removed = session.delete_where::<Tag>(Some(&field("label").eq("rust"))).unwrap();
    assert_eq!(removed, 1);
}

#[test]
fn test_paging_over_twenty_five_rows() {
    let mut session = session();
    session.insert_batch(&people(25)).unwrap();
    let order = OrderBy::new().asc("name");

    let first = session.select_page::<Person>(None, Some(&order), 1, 10).unwrap();
    assert_eq!(first.page_count, 3);
    assert_eq!(first.rows.len(), 10);
    assert_eq!(first.rows[0].name, "p01");

    let last = session.select_page::<Person>(None, Some(&order), 9, 10).unwrap();
    assert_eq!(last.page_index, 3);
    assert_eq!(last.rows.len(), 5);
    assert_eq!(last.rows[4].name, "p25");

    let filtered = session
        .select_page::<Person>(Some(&field("age").gt(40)), Some(&order), 1, 0)
        .unwrap();
    assert_eq!(filtered.record_count, 5);
    assert_eq!(filtered.page_size, 20);

    let none = session
        .select_page::<Person>(Some(&field("age").gt(100)), None, 2, 10)
        .unwrap();
    assert_eq!(none.page_count, 0);
    assert!(none.rows.is_empty());
}

#[test]
fn test_predicates_and_projections() {
    let mut session = session();
    session.insert_batch(&people(6)).unwrap();
    let mut eve = person("eve", 99);
    eve.email = Some("eve@example.com".into());
    session.insert(&eve).unwrap();

    let with_email: Vec<Person> = session
        .select_where(Some(&field("email").is_not_null()), None)
        .unwrap();
    assert_eq!(with_email.len(), 1);

    let names: Vec<String> = session
        .select_fields::<Person, String>(
            Some(&(field("name").starts_with("p") & field("age").le(23))),
            &Projection::field("name"),
        )
        .unwrap();
    assert_eq!(names.len(), 3);

    let picked: Vec<Person> = session
        .select_where(Some(&field("age").is_in([21, 23, 99])), Some(&OrderBy::new().desc("age")))
        .unwrap();
    assert_eq!(picked.iter().map(|p| p.age).collect::<Vec<_>>(), vec![99, 23, 21]);

    let oldest: i32 = session
        .select_aggregate::<Person, i32>(None, &Projection::field("age"), SelectKind::Max)
        .unwrap();
    assert_eq!(oldest, 99);

    let first = session
        .first::<Person>(Some(&!field("name").eq("eve")), Some(&OrderBy::new().desc("age")))
        .unwrap();
    assert_eq!(first.map(|p| p.name), Some("p06".to_string()));
}

#[test]
fn test_set_expressions() {
    let mut session = session();
    session.insert_batch(&people(4)).unwrap();

    let set = UpdateSet::new().set("age", field("age") + 10);
    let changed = session
        .update_set::<Person>(&set, Some(&field("age").lt(23)))
        .unwrap();
    assert_eq!(changed, 2);

    let mut ages: Vec<i32> = session
        .select_fields::<Person, i32>(None, &Projection::field("age"))
        .unwrap();
    ages.sort();
    assert_eq!(ages, vec![23, 24, 31, 32]);

    let mut p = person("p01", 0);
    p.email = Some("p01@example.com".into());
    let touched = session
        .update_fields(&p, &["email"], Some(&field("name").eq("p01")))
        .unwrap();
    assert_eq!(touched, 1);
}

#[test]
fn test_transaction_rollback_discards_writes() {
    let mut session = session();
    session.begin().unwrap();
    session.insert(&person("temp", 1)).unwrap();
    session.rollback().unwrap();
    assert_eq!(session.count::<Person>(None).unwrap(), 0);

    let result: rowmap::Result<()> = session.transaction(|s| {
        s.insert(&person("lost", 2))?;
        Err(Error::transaction("abort"))
    });
    assert!(result.is_err());
    assert_eq!(session.count::<Person>(None).unwrap(), 0);

    session
        .transaction(|s| s.insert(&person("kept", 3)).map(|_| ()))
        .unwrap();
    assert_eq!(session.count::<Person>(None).unwrap(), 1);
}

#[test]
fn test_atomic_batch_rolls_back_on_failure() {
    let mut session = session().with_options(Options::default().batch_size(2).atomic_batches(true));
    let mut batch = people(5);
    session
        .execute_sql("CREATE UNIQUE INDEX UX_PEOPLE_NAME ON PEOPLE (FULL_NAME)", &[])
        .unwrap();
    batch[4].name = batch[0].name.clone();

    let err = session.insert_batch(&batch).unwrap_err();
    assert!(matches!(err, Error::DataAccess { operation: "insert_batch", .. }));
    assert_eq!(session.count::<Person>(None).unwrap(), 0);
    assert!(!session.in_transaction());
}

#[test]
fn test_raw_sql() {
    let mut session = session();
    session.insert_batch(&people(3)).unwrap();

    let total: i64 = session
        .query_scalar(
            "SELECT SUM(age) FROM PEOPLE WHERE age >= @min",
            &[Parameter::new("min", 22)],
        )
        .unwrap();
    assert_eq!(total, 45);

    let rows = session
        .query_rows("SELECT FULL_NAME, age FROM PEOPLE ORDER BY age", &[])
        .unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0]["full_name"], Value::from("p01"));

    let typed: Vec<Person> = session
        .query_entities("SELECT * FROM PEOPLE WHERE FULL_NAME = @name", &[Parameter::new("name", "p02")])
        .unwrap();
    assert_eq!(typed[0].age, 22);

    let page = session
        .query_page("SELECT FULL_NAME FROM PEOPLE", &[], Some("FULL_NAME DESC"), 1, 2)
        .unwrap();
    assert_eq!(page.page_count, 2);
    assert_eq!(page.rows[0].get(0), Some(&Value::from("p03")));
}
