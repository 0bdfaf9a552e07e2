#![allow(dead_code)]

use std::sync::Arc;

use vtable_lib::model::Record;

/// Row with an `id` and a `name`.
pub fn person(id: i64, name: &str) -> Arc<Record> {
    Arc::new(Record::new().set("id", id).set("name", name))
}

/// Rows named after `names`, with ids counting from 1.
pub fn people(names: &[&str]) -> Vec<Arc<Record>> {
    names
        .iter()
        .enumerate()
        .map(|(i, name)| person(i as i64 + 1, name))
        .collect()
}

/// Names of `rows`, in order.
pub fn names(rows: &[Arc<Record>]) -> Vec<String> {
    rows.iter()
        .map(|row| row.get_string("name").ok().flatten().unwrap_or_default().to_string())
        .collect()
}
