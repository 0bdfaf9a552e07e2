//! Selection through the store: modes, bulk operations and reconciliation.

mod common;

use std::sync::Arc;

use common::names;
use common::people;
use common::person;
use vtable_lib::SelectionMode;
use vtable_lib::Store;
use vtable_lib::model::Record;
use vtable_lib::query::Filter;
use vtable_lib::query::FilterSet;
use vtable_lib::query::SortSpec;

fn multiple(data: &[Arc<Record>]) -> Store<Record> {
    let store = Store::with_data(data.to_vec());
    store.set_selection_mode(SelectionMode::Multiple).unwrap();
    store
}

#[test]
fn test_single_mode_replaces_selection() {
    let data = people(&["A", "B"]);
    let store = Store::with_data(data.clone());

    store.select_row(&data[0]).unwrap();
    store.select_row(&data[1]).unwrap();

    assert_eq!(names(&store.state().selected_rows), ["B"]);
}

#[test]
fn test_multiple_mode_appends_once() {
    let data = people(&["A", "B"]);
    let store = multiple(&data);

    store.select_row(&data[1]).unwrap();
    store.select_row(&data[0]).unwrap();
    store.select_row(&data[1]).unwrap();

    assert_eq!(names(&store.state().selected_rows), ["B", "A"]);
}

#[test]
fn test_select_rows_in_single_mode_keeps_last() {
    let data = people(&["A", "B", "C"]);
    let store = Store::with_data(data.clone());

    store.select_rows(&data).unwrap();

    assert_eq!(names(&store.state().selected_rows), ["C"]);
}

#[test]
fn test_selecting_unknown_row_is_ignored() {
    let data = people(&["A"]);
    let store = multiple(&data);
    let stranger = person(9, "A");

    store.select_row(&stranger).unwrap();
    store.select_rows(&[Arc::clone(&stranger)]).unwrap();

    assert!(store.state().selected_rows.is_empty());
    assert!(!store.is_selected(&stranger));
}

#[test]
fn test_identity_not_equality_decides_selection() {
    let twin_a = person(1, "Twin");
    let twin_b = person(1, "Twin");
    let store = multiple(&[Arc::clone(&twin_a), Arc::clone(&twin_b)]);

    store.select_row(&twin_a).unwrap();

    assert!(store.is_selected(&twin_a));
    assert!(!store.is_selected(&twin_b));
}

#[test]
fn test_deselect_unselected_row_is_noop() {
    let data = people(&["A", "B"]);
    let store = multiple(&data);
    store.select_row(&data[0]).unwrap();
    let before = store.state();

    store.deselect_row(&data[1]).unwrap();

    assert!(Arc::ptr_eq(&before, &store.state()));
}

#[test]
fn test_deselect_rows() {
    let data = people(&["A", "B", "C"]);
    let store = multiple(&data);
    store.select_rows(&data).unwrap();

    store.deselect_rows(&data[..2]).unwrap();

    assert_eq!(names(&store.state().selected_rows), ["C"]);
}

#[test]
fn test_select_all_takes_every_filtered_row_in_order() {
    let data = people(&["Bob", "Ann", "Cid", "Anna"]);
    let store = multiple(&data);
    store
        .batch(|s| {
            s.set_filters(FilterSet::new().with("search", Filter::basic("an", ["name"])))?;
            s.set_sort(SortSpec::asc("name"))?;
            s.set_page_size(Some(1))
        })
        .unwrap();

    store.select_all().unwrap();

    let state = store.state();
    assert_eq!(state.rows.len(), 1);
    assert_eq!(names(&state.selected_rows), ["Ann", "Anna"]);
}

#[test]
fn test_select_all_is_idempotent() {
    let data = people(&["A", "B", "C"]);
    let store = multiple(&data);

    store.select_all().unwrap();
    let once = store.state();
    store.select_all().unwrap();

    assert!(Arc::ptr_eq(&once, &store.state()));
    assert_eq!(names(&once.selected_rows), ["A", "B", "C"]);
}

#[test]
fn test_select_all_is_rejected_in_single_mode() {
    let data = people(&["A", "B"]);
    let store = Store::with_data(data.clone());
    store.select_row(&data[0]).unwrap();

    store.select_all().unwrap();

    assert_eq!(names(&store.state().selected_rows), ["A"]);
}

#[test]
fn test_deselect_all_works_in_every_mode() {
    let data = people(&["A", "B"]);
    let store = Store::with_data(data.clone());
    store.select_row(&data[0]).unwrap();

    store.deselect_all().unwrap();

    assert!(store.state().selected_rows.is_empty());
}

#[test]
fn test_switching_to_single_keeps_latest_selection() {
    let data = people(&["A", "B", "C"]);
    let store = multiple(&data);
    store.select_row(&data[2]).unwrap();
    store.select_row(&data[0]).unwrap();

    store.set_selection_mode(SelectionMode::Single).unwrap();

    assert_eq!(names(&store.state().selected_rows), ["A"]);
}

#[test]
fn test_toggle_all_rows() {
    let data = people(&["A", "B"]);
    let store = multiple(&data);
    assert!(!store.all_rows_selected().unwrap());

    store.toggle_all_rows().unwrap();
    assert!(store.all_rows_selected().unwrap());
    assert_eq!(store.state().selected_rows.len(), 2);

    store.toggle_all_rows().unwrap();
    assert!(!store.all_rows_selected().unwrap());
    assert!(store.state().selected_rows.is_empty());
}

#[test]
fn test_all_rows_selected_needs_rows() {
    let store: Store<Record> = Store::new();
    store.set_selection_mode(SelectionMode::Multiple).unwrap();
    store.select_all().unwrap();

    assert!(!store.all_rows_selected().unwrap());
}

#[test]
fn test_all_rows_selected_considers_filtered_rows_only() {
    let data = people(&["Ann", "Bob"]);
    let store = multiple(&data);
    store
        .set_filters(FilterSet::new().with("search", Filter::basic("ann", ["name"])))
        .unwrap();

    store.select_row(&data[0]).unwrap();

    assert!(store.all_rows_selected().unwrap());
}

#[test]
fn test_removed_rows_leave_the_selection() {
    let data = people(&["A", "B", "C"]);
    let store = multiple(&data);
    store.select_rows(&data).unwrap();

    store.set_data(vec![Arc::clone(&data[0]), Arc::clone(&data[2])]).unwrap();

    let state = store.state();
    assert_eq!(names(&state.selected_rows), ["A", "C"]);
    for row in &state.selected_rows {
        assert!(state.data.iter().any(|r| Arc::ptr_eq(r, row)));
    }
}

#[test]
fn test_filtered_out_rows_stay_selected() {
    let data = people(&["Ann", "Bob"]);
    let store = multiple(&data);
    store.select_rows(&data).unwrap();

    store
        .set_filters(FilterSet::new().with("search", Filter::basic("ann", ["name"])))
        .unwrap();

    assert_eq!(names(&store.state().selected_rows), ["Ann", "Bob"]);
    assert!(store.state().is_selected(&data[1]));
}

#[test]
fn test_toggle_all_rows_inside_batch_sees_new_data() {
    let data = people(&["A", "B", "C"]);
    let store = multiple(&data);
    store.select_all().unwrap();

    store
        .batch(|s| {
            s.set_data(vec![Arc::clone(&data[0]), Arc::clone(&data[1])])?;
            assert!(s.all_rows_selected()?);
            s.toggle_all_rows()
        })
        .unwrap();

    assert!(store.state().selected_rows.is_empty());
    assert!(!store.all_rows_selected().unwrap());
}
