//! Filter, sort and pagination engines, exercised without a store.

mod common;

use std::cmp::Ordering;
use std::sync::Arc;

use common::names;
use common::people;
use common::person;
use vtable_lib::TableError;
use vtable_lib::model::Record;
use vtable_lib::model::Value;
use vtable_lib::query::BasicFilter;
use vtable_lib::query::CustomFilter;
use vtable_lib::query::CustomSort;
use vtable_lib::query::Filter;
use vtable_lib::query::FilterSet;
use vtable_lib::query::Pagination;
use vtable_lib::query::SortKey;
use vtable_lib::query::SortOrder;
use vtable_lib::query::SortSpec;
use vtable_lib::query::paginate;

// =============================================================================
// Filters
// =============================================================================

#[test]
fn test_basic_filter_is_case_insensitive_substring() {
    let data = people(&["Ann", "Bob", "Anna"]);
    let filters = FilterSet::new().with("search", Filter::basic("AN", ["name"]));

    let survivors = filters.apply(&data).unwrap();
    assert_eq!(names(&survivors), ["Ann", "Anna"]);
}

#[test]
fn test_blank_basic_filter_matches_everything() {
    let data = people(&["Ann", "Bob"]);
    for value in ["", "   "] {
        let filters = FilterSet::new().with("search", Filter::basic(value, ["name"]));
        assert_eq!(filters.apply(&data).unwrap().len(), 2);
    }
}

#[test]
fn test_basic_filter_without_keys_matches_nothing() {
    let data = people(&["Ann", "Bob"]);
    let filters = FilterSet::new().with("search", BasicFilter::new("a", Vec::<String>::new()));
    assert!(filters.apply(&data).unwrap().is_empty());
}

#[test]
fn test_basic_filter_skips_null_and_missing_fields() {
    let data = vec![
        Arc::new(Record::new().set("name", "Ann").set("email", Value::Null)),
        Arc::new(Record::new().set("name", "Bob").set("email", "bob@null.org")),
    ];
    let filters = FilterSet::new().with("search", Filter::basic("null", ["email", "phone"]));

    assert_eq!(names(&filters.apply(&data).unwrap()), ["Bob"]);
}

#[test]
fn test_exact_basic_filter() {
    let data = people(&["Ann", "Anna", "ann"]);
    let filters = FilterSet::new().with("name", BasicFilter::new("ANN", ["name"]).exact());

    assert_eq!(names(&filters.apply(&data).unwrap()), ["Ann", "ann"]);
}

#[test]
fn test_basic_filter_matches_any_key_and_coerces_numbers() {
    let data = vec![
        Arc::new(Record::new().set("name", "Ann").set("zip", 2134)),
        Arc::new(Record::new().set("name", "Bob").set("zip", 9999)),
    ];
    let filters = FilterSet::new().with("search", Filter::basic("213", ["name", "zip"]));

    assert_eq!(names(&filters.apply(&data).unwrap()), ["Ann"]);
}

#[test]
fn test_basic_filter_follows_dotted_paths() {
    let data = vec![
        Arc::new(
            Record::new()
                .set("name", "Ann")
                .set("address", Record::new().set("city", "Oslo")),
        ),
        Arc::new(
            Record::new()
                .set("name", "Bob")
                .set("address", Record::new().set("city", "Rome")),
        ),
    ];
    let filters = FilterSet::new().with("city", Filter::basic("os", ["address.city"]));

    assert_eq!(names(&filters.apply(&data).unwrap()), ["Ann"]);
}

#[test]
fn test_custom_filter_receives_its_value() {
    let data = vec![
        Arc::new(Record::new().set("name", "Ann").set("age", 31)),
        Arc::new(Record::new().set("name", "Bob").set("age", 17)),
    ];
    let adults = Filter::custom(18, |min: Option<&Value>, row: &Record| {
        let min = min.and_then(Value::as_number).unwrap_or(0.0);
        row.get("age").and_then(Value::as_number).is_some_and(|age| age >= min)
    });
    let filters = FilterSet::new().with("adults", adults);

    assert_eq!(names(&filters.apply(&data).unwrap()), ["Ann"]);
}

#[test]
fn test_filters_are_anded() {
    let data = people(&["Ann", "Anna", "Bob", "Hannah"]);
    let filters = FilterSet::new()
        .with("search", Filter::basic("an", ["name"]))
        .with("short", Filter::custom(Value::Null, |_: Option<&Value>, row: &Record| {
            row.get_string("name").ok().flatten().is_some_and(|n| n.len() <= 4)
        }));

    let survivors = filters.apply(&data).unwrap();
    assert_eq!(names(&survivors), ["Ann", "Anna"]);
    for row in &survivors {
        assert!(filters.matches(row).unwrap());
        assert!(data.iter().any(|r| Arc::ptr_eq(r, row)));
    }
}

#[test]
fn test_failing_predicate_names_the_filter() {
    let data = people(&["Ann"]);
    let broken = CustomFilter::try_new(None, |_: Option<&Value>, _: &Record| Err("boom".into()));
    let filters = FilterSet::new().with("broken", broken);

    match filters.apply(&data) {
        Err(TableError::Filter { name, source }) => {
            assert_eq!(name, "broken");
            assert_eq!(source.to_string(), "boom");
        }
        other => panic!("expected filter error, got {other:?}"),
    }
}

#[test]
fn test_filter_set_equality() {
    let custom = CustomFilter::new(Some(Value::from(1)), |_: Option<&Value>, _: &Record| true);

    let a = FilterSet::new()
        .with("search", Filter::basic("an", ["name"]))
        .with("custom", custom.clone());
    let b = FilterSet::new()
        .with("search", Filter::basic("an", ["name"]))
        .with("custom", custom.clone());
    assert_eq!(a, b);

    let other_value = a.clone().with("custom", custom.with_value(Some(Value::from(2))));
    assert_ne!(a, other_value);

    let other_predicate = a
        .clone()
        .with("custom", CustomFilter::new(Some(Value::from(1)), |_: Option<&Value>, _: &Record| true));
    assert_ne!(a, other_predicate);
}

// =============================================================================
// Sorting
// =============================================================================

#[test]
fn test_sort_by_name_ascending_and_descending() {
    let mut rows = people(&["Bob", "Ann", "Anna"]);
    SortSpec::asc("name").sort(&mut rows).unwrap();
    assert_eq!(names(&rows), ["Ann", "Anna", "Bob"]);

    SortSpec::desc("name").sort(&mut rows).unwrap();
    assert_eq!(names(&rows), ["Bob", "Anna", "Ann"]);
}

#[test]
fn test_sort_is_stable() {
    let mut rows = vec![
        Arc::new(Record::new().set("name", "b").set("group", 1)),
        Arc::new(Record::new().set("name", "a").set("group", 2)),
        Arc::new(Record::new().set("name", "c").set("group", 1)),
        Arc::new(Record::new().set("name", "d").set("group", 2)),
    ];
    SortSpec::asc("group").sort(&mut rows).unwrap();
    assert_eq!(names(&rows), ["b", "c", "a", "d"]);
}

#[test]
fn test_sort_numbers_numerically() {
    let mut rows: Vec<Arc<Record>> = [10, 9, 100]
        .into_iter()
        .map(|n| Arc::new(Record::new().set("name", n.to_string()).set("n", n)))
        .collect();
    SortSpec::asc("n").sort(&mut rows).unwrap();
    assert_eq!(names(&rows), ["9", "10", "100"]);
}

#[test]
fn test_sort_collates_strings() {
    let mut rows = people(&["b", "B", "a", "A"]);
    SortSpec::asc("name").sort(&mut rows).unwrap();
    assert_eq!(names(&rows), ["a", "A", "b", "B"]);
}

#[test]
fn test_sort_treats_missing_as_empty() {
    let mut rows = vec![
        Arc::new(Record::new().set("name", "x").set("tag", "b")),
        Arc::new(Record::new().set("name", "y")),
        Arc::new(Record::new().set("name", "z").set("tag", "a")),
    ];
    SortSpec::asc("tag").sort(&mut rows).unwrap();
    assert_eq!(names(&rows), ["y", "z", "x"]);
}

#[test]
fn test_sort_order_none_keeps_input_order() {
    let mut rows = people(&["Bob", "Ann", "Anna"]);
    SortSpec::by("name", SortOrder::None).sort(&mut rows).unwrap();
    assert_eq!(names(&rows), ["Bob", "Ann", "Anna"]);
}

#[test]
fn test_sort_by_extractor() {
    let mut rows = people(&["Anna", "Bo", "Ann"]);
    let by_length = SortKey::extractor(|row: &Record, _| {
        Value::from(row.get_string("name").ok().flatten().map_or(0, str::len) as i64)
    });
    SortSpec::asc(by_length).sort(&mut rows).unwrap();
    assert_eq!(names(&rows), ["Bo", "Ann", "Anna"]);
}

#[test]
fn test_custom_comparator_decides_alone() {
    let mut rows = people(&["Ann", "Bob", "Cid"]);
    // Ignores the order it is given.
    let reverse = CustomSort::new(|a: &Record, b: &Record, _| {
        let a = a.get_string("name").ok().flatten().unwrap_or_default();
        let b = b.get_string("name").ok().flatten().unwrap_or_default();
        b.cmp(a)
    });
    SortSpec::asc("name").with_custom(reverse).sort(&mut rows).unwrap();
    assert_eq!(names(&rows), ["Cid", "Bob", "Ann"]);
}

#[test]
fn test_failing_comparator_is_reported() {
    let mut rows = people(&["Ann", "Bob"]);
    let broken = CustomSort::try_new(|_: &Record, _: &Record, _| Err("no order".into()));
    let result = SortSpec::custom(broken, SortOrder::Asc).sort(&mut rows);
    assert!(matches!(result, Err(TableError::Sort { .. })));
}

#[test]
fn test_compare_reports_ordering() {
    let spec: SortSpec<Record> = SortSpec::desc("name");
    let (a, b) = (person(1, "Ann"), person(2, "Bob"));
    assert_eq!(spec.compare(&a, &b).unwrap(), Ordering::Greater);
}

#[test]
fn test_sort_order_toggle_and_parse() {
    assert_eq!(SortOrder::Asc.toggled(), SortOrder::Desc);
    assert_eq!(SortOrder::Desc.toggled(), SortOrder::Asc);
    assert_eq!(SortOrder::None.toggled(), SortOrder::Asc);
    assert_eq!("desc".parse::<SortOrder>().unwrap(), SortOrder::Desc);
    assert!("sideways".parse::<SortOrder>().is_err());
}

// =============================================================================
// Pagination
// =============================================================================

#[test]
fn test_paginate_second_page() {
    let rows = people(&["a", "b", "c"]);
    let page = paginate(&rows, Pagination::new().with_page_size(2).with_current_page(2));

    assert_eq!(names(&page.rows), ["c"]);
    assert_eq!(page.total_items, 3);
    assert_eq!(page.total_pages, 2);
    assert_eq!(page.current_page, 2);
}

#[test]
fn test_paginate_without_page_size() {
    let rows = people(&["a", "b", "c"]);
    for pagination in [
        Pagination::new(),
        Pagination::new().with_page_size(0),
        Pagination::new().with_current_page(3),
    ] {
        let page = paginate(&rows, pagination);
        assert_eq!(page.rows.len(), 3);
        assert_eq!(page.total_pages, 1);
        assert_eq!(page.current_page, 1);
        assert!(!page.clamped);
    }
}

#[test]
fn test_paginate_clamps_out_of_range_pages() {
    let rows = people(&["a", "b", "c", "d", "e"]);

    let high = paginate(&rows, Pagination::new().with_page_size(2).with_current_page(9));
    assert_eq!(high.current_page, 3);
    assert_eq!(names(&high.rows), ["e"]);
    assert!(high.clamped);

    let low = paginate(&rows, Pagination::new().with_page_size(2).with_current_page(0));
    assert_eq!(low.current_page, 1);
    assert_eq!(names(&low.rows), ["a", "b"]);

    let unset = paginate(&rows, Pagination::new().with_page_size(2));
    assert_eq!(unset.current_page, 1);
    assert!(!unset.clamped);
}

#[test]
fn test_paginate_empty_sequence_has_one_page() {
    let rows: Vec<Arc<Record>> = Vec::new();
    let page = paginate(&rows, Pagination::new().with_page_size(10).with_current_page(4));

    assert!(page.rows.is_empty());
    assert_eq!(page.total_items, 0);
    assert_eq!(page.total_pages, 1);
    assert_eq!(page.current_page, 1);
}

#[test]
fn test_page_rows_are_consistent_with_totals() {
    let rows = people(&["a", "b", "c", "d", "e", "f", "g"]);
    for size in 1..=8 {
        let total_pages = paginate(&rows, Pagination::new().with_page_size(size)).total_pages;
        let mut seen = Vec::new();
        for number in 1..=total_pages {
            let page = paginate(&rows, Pagination::new().with_page_size(size).with_current_page(number));
            assert!(page.rows.len() <= size);
            seen.extend(page.rows);
        }
        assert_eq!(names(&seen), names(&rows));
    }
}
