use datasample::prelude::*;
use datasample::{StoreErrorKind, ValidationErrorKind};

fn registry() -> Registry {
    Registry::new()
        .with(EntitySchema::new("auth.User"))
        .with(EntitySchema::new("shop.Country").primary_key("code"))
        .with(
            EntitySchema::new("shop.Address").relationship(RelationshipInfo::many_to_one(
                "country",
                "shop.Country",
                "country_id",
            )),
        )
        .with(
            EntitySchema::new("shop.Customer")
                .relationship(RelationshipInfo::one_to_one("user", "auth.User", "user_id"))
                .relationship(RelationshipInfo::many_to_one(
                    "address",
                    "shop.Address",
                    "address_id",
                )),
        )
        .with(EntitySchema::new("shop.Product"))
        .with(
            EntitySchema::new("shop.Order").relationship(RelationshipInfo::many_to_one(
                "customer",
                "shop.Customer",
                "customer_id",
            )),
        )
        .with(
            EntitySchema::new("shop.OrderLine")
                .relationship(RelationshipInfo::many_to_one("order", "shop.Order", "order_id"))
                .relationship(RelationshipInfo::many_to_one(
                    "product",
                    "shop.Product",
                    "product_id",
                )),
        )
}

fn source() -> MemoryConnection {
    let mut source = MemoryConnection::new("default").with_description("shop @ primary");
    source.seed(
        "auth.User",
        (1..=4_i64).map(|i| Record::new(i).with("username", format!("user{i}"))),
    );
    source.seed(
        "shop.Country",
        [
            Record::new("fi").with("name", "Finland"),
            Record::new("se").with("name", "Sweden"),
        ],
    );
    source.seed(
        "shop.Address",
        [
            Record::new(10_i64).with("country_id", "fi"),
            Record::new(11_i64).with("country_id", "se"),
            Record::new(12_i64).with("country_id", "fi"),
        ],
    );
    source.seed(
        "shop.Customer",
        [
            Record::new(100_i64)
                .with("user_id", 1_i64)
                .with("address_id", 10_i64),
            Record::new(101_i64)
                .with("user_id", 2_i64)
                .with("address_id", 11_i64),
            Record::new(102_i64)
                .with("user_id", 3_i64)
                .with("address_id", Value::Null),
        ],
    );
    source.seed(
        "shop.Product",
        [1000_i64, 1001, 1002].map(|i| Record::new(i).with("price", 9.5)),
    );
    source.seed(
        "shop.Order",
        [(500_i64, 100_i64), (501, 101), (502, 102)]
            .map(|(id, customer)| Record::new(id).with("customer_id", customer)),
    );
    source.seed(
        "shop.OrderLine",
        [
            (1_i64, 500_i64, 1000_i64),
            (2, 500, 1001),
            (3, 501, 1000),
            (4, 501, 1002),
            (5, 502, 1001),
            (6, 502, 1001),
        ]
        .map(|(id, order, product)| {
            Record::new(id)
                .with("order_id", order)
                .with("product_id", product)
                .with("quantity", 1_i64)
        }),
    );
    source
}

fn destination() -> MemoryConnection {
    MemoryConnection::new("replica").with_schema(registry())
}

fn lines(ids: impl IntoIterator<Item = i64>) -> Selection {
    ids.into_iter().map(|id| ("shop.OrderLine", id)).collect()
}

fn count(conn: &MemoryConnection, label: &str) -> usize {
    conn.count(&EntityType::new(label))
}

#[test]
fn import_copies_every_referenced_record() {
    let registry = registry();
    let mut importer = Importer::new(source(), destination(), &registry);

    let report = importer.import(lines([1, 3, 4])).unwrap();

    let destination = importer.destination();
    assert_eq!(count(destination, "shop.OrderLine"), 3);
    assert_eq!(count(destination, "shop.Order"), 2);
    assert_eq!(count(destination, "shop.Customer"), 2);
    assert_eq!(count(destination, "auth.User"), 2);
    assert_eq!(count(destination, "shop.Address"), 2);
    assert_eq!(count(destination, "shop.Country"), 2);
    assert_eq!(count(destination, "shop.Product"), 2);
    assert_eq!(report.total_inserted(), 15);

    let copied = destination
        .get(&EntityType::new("shop.OrderLine"), &Key::Int(4))
        .unwrap();
    assert_eq!(copied.get("product_id"), Some(&Value::BigInt(1002)));
    assert_eq!(copied.get("quantity"), Some(&Value::BigInt(1)));
}

#[test]
fn report_lists_types_in_creation_order() {
    let registry = registry();
    let mut importer = Importer::new(source(), destination(), &registry);

    let report = importer.import(lines([5])).unwrap();

    let position = |label: &str| {
        report
            .entities
            .iter()
            .position(|e| e.entity == label)
            .unwrap()
    };
    assert!(position("shop.Order") < position("shop.OrderLine"));
    assert!(position("shop.Customer") < position("shop.Order"));
    assert!(position("auth.User") < position("shop.Customer"));
    assert!(position("shop.Country") < position("shop.Address"));

    // Customer 102 has no address, so neither addresses nor countries are copied.
    let address = report.get(&EntityType::new("shop.Address")).unwrap();
    assert_eq!((address.expanded, address.inserted), (0, 0));

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["entities"].as_array().unwrap().len(), report.entities.len());
}

#[test]
fn second_import_inserts_nothing() {
    let registry = registry();
    let mut importer = Importer::new(source(), destination(), &registry);

    let first = importer.import(lines(1..=6)).unwrap();
    let second = importer.import(lines(1..=6)).unwrap();

    assert_eq!(first.total_inserted(), 22);
    assert_eq!(second.total_inserted(), 0);
    assert_eq!(second.total_already_present(), 22);
    assert_eq!(importer.destination().stats().commits, 2);
}

#[test]
fn records_already_at_destination_are_skipped() {
    let registry = registry();
    let mut destination = destination();
    destination.seed("auth.User", [Record::new(1_i64).with("username", "local")]);
    destination.seed("shop.Country", [Record::new("fi")]);
    let mut importer = Importer::new(source(), destination, &registry);

    let report = importer.import(lines([1])).unwrap();

    let user = report.get(&EntityType::new("auth.User")).unwrap();
    assert_eq!((user.already_present, user.inserted), (1, 0));
    assert_eq!(report.total_inserted(), 5);

    // The existing record is left alone.
    let kept = importer
        .destination()
        .get(&EntityType::new("auth.User"), &Key::Int(1))
        .unwrap();
    assert_eq!(kept.get("username").and_then(Value::as_str), Some("local"));
}

#[test]
fn failure_mid_copy_leaves_destination_untouched() {
    let registry = registry();
    let destination = destination().fail_insert_on("shop.OrderLine", 2);
    let config = ImportConfig::new().batch_size(BatchSize::new(2).unwrap());
    let mut importer = Importer::new(source(), destination, &registry).with_config(config);

    let err = importer.import(lines(1..=6)).unwrap_err();

    match err {
        Error::Store(e) => assert_eq!(e.kind, StoreErrorKind::Write),
        other => panic!("unexpected error: {other}"),
    }
    let destination = importer.destination();
    for label in [
        "auth.User",
        "shop.Country",
        "shop.Address",
        "shop.Customer",
        "shop.Product",
        "shop.Order",
        "shop.OrderLine",
    ] {
        assert_eq!(count(destination, label), 0, "{label} must be rolled back");
    }
    assert_eq!(destination.stats().rollbacks, 1);

    // A clean retry copies everything.
    let mut importer = Importer::new(source(), self::destination(), &registry);
    assert_eq!(importer.import(lines(1..=6)).unwrap().total_inserted(), 22);
}

#[test]
fn cycle_aborts_before_any_io() {
    let registry = Registry::new()
        .with(
            EntitySchema::new("graph.A")
                .relationship(RelationshipInfo::many_to_one("b", "graph.B", "b_id")),
        )
        .with(
            EntitySchema::new("graph.B")
                .relationship(RelationshipInfo::many_to_one("c", "graph.C", "c_id")),
        )
        .with(
            EntitySchema::new("graph.C")
                .relationship(RelationshipInfo::many_to_one("a", "graph.A", "a_id")),
        );
    let mut source = MemoryConnection::new("default");
    source.seed("graph.A", [Record::new(1_i64).with("b_id", 1_i64)]);
    let mut importer = Importer::new(source, MemoryConnection::new("replica"), &registry);

    let selection: Selection = [("graph.A", 1_i64)].into_iter().collect();
    let err = importer.import(selection).unwrap_err();

    match &err {
        Error::CircularRelationship(cycle) => {
            assert_eq!(cycle.labels(), vec!["graph.A", "graph.B", "graph.C", "graph.A"]);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(err.to_string().contains("graph.A -> graph.B -> graph.C -> graph.A"));
    assert_eq!(importer.source().stats().reads, 0);
    assert_eq!(importer.destination().stats().transactions, 0);
}

#[test]
fn self_references_are_not_followed() {
    let registry = Registry::new().with(
        EntitySchema::new("hr.Employee").relationship(RelationshipInfo::many_to_one(
            "manager",
            "hr.Employee",
            "manager_id",
        )),
    );
    let mut source = MemoryConnection::new("default");
    source.seed(
        "hr.Employee",
        [
            Record::new(1_i64).with("manager_id", Value::Null),
            Record::new(2_i64).with("manager_id", 1_i64),
        ],
    );
    let destination = MemoryConnection::new("replica").with_schema(registry.clone());
    let mut importer = Importer::new(source, destination, &registry);

    let selection: Selection = [("hr.Employee", 2_i64)].into_iter().collect();
    let report = importer.import(selection).unwrap();

    assert_eq!(report.total_inserted(), 1);
    assert!(
        importer
            .destination()
            .get(&EntityType::new("hr.Employee"), &Key::Int(1))
            .is_none()
    );
}

#[test]
fn same_store_is_rejected() {
    let registry = registry();
    let mut importer = Importer::new(source(), MemoryConnection::new("default"), &registry);

    let err = importer.import(lines([1])).unwrap_err();

    assert!(err.is_validation());
    match err {
        Error::Validation(e) => assert_eq!(e.kind, ValidationErrorKind::SameStore),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(importer.source().stats().reads, 0);
}

#[test]
fn non_positive_batch_sizes_are_rejected() {
    for size in [0_i64, -1, -100] {
        let err = BatchSize::try_from(size).unwrap_err();
        assert_eq!(err.kind, ValidationErrorKind::BatchSize);
    }
}

#[test]
fn empty_selection_is_a_no_op() {
    let registry = registry();
    let mut importer = Importer::new(source(), destination(), &registry);

    let report = importer.import(Selection::new()).unwrap();

    assert!(report.entities.is_empty());
    assert_eq!(importer.destination().stats().commits, 1);
    assert_eq!(importer.source().stats().reads, 0);
}

#[test]
fn cancellation_flag_stops_the_import() {
    let registry = registry();
    let cancel = CancelFlag::new();
    let mut importer =
        Importer::new(source(), destination(), &registry).with_cancel_flag(cancel.clone());

    cancel.cancel();
    let err = importer.import(lines(1..=6)).unwrap_err();

    assert!(matches!(err, Error::Cancelled));
    assert_eq!(count(importer.destination(), "shop.OrderLine"), 0);
}
