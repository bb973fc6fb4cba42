use std::collections::{BTreeMap, HashSet};

use crate::error::HistoryError;
use crate::trackable::Trackable;
use vesicle_common::HistoriesSnapshot;

#[derive(Debug, Clone)]
struct RegisteredObject {
    name: String,
    fields: Vec<&'static str>,
}

/// Append-only time series keyed by `"{object}_{field}"`.
///
/// The storage keeps no references to the tracked objects; callers pass them
/// in on every [`update_histories`](Self::update_histories).
#[derive(Debug, Clone, Default)]
pub struct HistoriesStorage {
    objects: Vec<RegisteredObject>,
    histories: BTreeMap<String, Vec<f64>>,
}

pub fn history_key(object: &str, field: &str) -> String {
    format!("{}_{}", object, field)
}

impl HistoriesStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `object` and creates an empty sequence for each of its fields.
    pub fn register_object(&mut self, object: &dyn Trackable) -> Result<(), HistoryError> {
        let name = object.display_name();
        if self.is_registered(name) {
            return Err(HistoryError::DuplicateObject { name: name.to_string() });
        }

        let fields: Vec<&'static str> = object.current_state().into_iter().map(|(field, _)| field).collect();
        for field in &fields {
            self.histories.entry(history_key(name, field)).or_default();
        }
        self.objects.push(RegisteredObject {
            name: name.to_string(),
            fields,
        });
        Ok(())
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.objects.iter().any(|object| object.name == name)
    }

    /// Appends the current state of every registered object.
    ///
    /// `objects` must contain each registered object exactly once. Nothing is
    /// appended unless the whole set is valid.
    pub fn update_histories<'a, I>(&mut self, objects: I) -> Result<(), HistoryError>
    where
        I: IntoIterator<Item = &'a dyn Trackable>,
    {
        let mut seen = HashSet::new();
        let mut pending = Vec::new();

        for object in objects {
            let name = object.display_name();
            let registered = self
                .objects
                .iter()
                .find(|registered| registered.name == name)
                .ok_or_else(|| HistoryError::UnregisteredObject { name: name.to_string() })?;
            if !seen.insert(name.to_string()) {
                return Err(HistoryError::DuplicateObject { name: name.to_string() });
            }

            for (field, value) in object.current_state() {
                if !registered.fields.contains(&field) {
                    return Err(HistoryError::UnknownField {
                        name: name.to_string(),
                        field: field.to_string(),
                    });
                }
                pending.push((history_key(name, field), value));
            }
        }

        if let Some(missing) = self.objects.iter().find(|object| !seen.contains(&object.name)) {
            return Err(HistoryError::MissingObject {
                name: missing.name.clone(),
            });
        }

        for (key, value) in pending {
            self.histories.entry(key).or_default().push(value);
        }
        Ok(())
    }

    /// Appends `value` to the sequence `name`, creating it if needed.
    pub fn add_history(&mut self, name: &str, value: f64) {
        match self.histories.get_mut(name) {
            Some(values) => values.push(value),
            None => {
                self.histories.insert(name.to_string(), vec![value]);
            }
        }
    }

    /// Clears every recorded value; registrations and keys are kept.
    pub fn flush(&mut self) {
        for values in self.histories.values_mut() {
            values.clear();
        }
    }

    pub fn history(&self, key: &str) -> Option<&[f64]> {
        self.histories.get(key).map(Vec::as_slice)
    }

    pub fn lengths(&self) -> BTreeMap<String, usize> {
        self.histories
            .iter()
            .map(|(key, values)| (key.clone(), values.len()))
            .collect()
    }

    pub fn snapshot(&self) -> HistoriesSnapshot {
        HistoriesSnapshot::new(self.histories.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Gauge {
        name: &'static str,
        value: f64,
    }

    impl Trackable for Gauge {
        fn display_name(&self) -> &str {
            self.name
        }

        fn current_state(&self) -> Vec<(&'static str, f64)> {
            vec![("a", self.value), ("b", 2.0 * self.value)]
        }
    }

    #[test]
    fn test_register_creates_empty_sequences() {
        let mut storage = HistoriesStorage::new();
        storage.register_object(&Gauge { name: "p", value: 1.0 }).unwrap();
        assert_eq!(storage.history("p_a"), Some(&[][..]));
        assert_eq!(storage.history("p_b"), Some(&[][..]));
        assert!(matches!(
            storage.register_object(&Gauge { name: "p", value: 3.0 }),
            Err(HistoryError::DuplicateObject { .. })
        ));
    }

    #[test]
    fn test_update_keeps_sequences_in_lock_step() {
        let mut storage = HistoriesStorage::new();
        let mut first = Gauge { name: "p", value: 1.0 };
        let second = Gauge { name: "q", value: 5.0 };
        storage.register_object(&first).unwrap();
        storage.register_object(&second).unwrap();

        storage.update_histories([&first as &dyn Trackable, &second]).unwrap();
        first.value = 2.0;
        storage.update_histories([&second as &dyn Trackable, &first]).unwrap();

        assert_eq!(storage.history("p_a"), Some(&[1.0, 2.0][..]));
        assert_eq!(storage.history("p_b"), Some(&[2.0, 4.0][..]));
        assert_eq!(storage.history("q_a"), Some(&[5.0, 5.0][..]));
        assert!(storage.lengths().values().all(|&len| len == 2));
    }

    #[test]
    fn test_update_rejects_incomplete_or_unknown_sets() {
        let mut storage = HistoriesStorage::new();
        let registered = Gauge { name: "p", value: 1.0 };
        let stranger = Gauge { name: "x", value: 1.0 };
        storage.register_object(&registered).unwrap();

        assert!(matches!(
            storage.update_histories(std::iter::empty::<&dyn Trackable>()),
            Err(HistoryError::MissingObject { .. })
        ));
        assert!(matches!(
            storage.update_histories([&registered as &dyn Trackable, &stranger]),
            Err(HistoryError::UnregisteredObject { .. })
        ));
        assert_eq!(storage.history("p_a"), Some(&[][..]), "failed updates append nothing");
    }

    #[test]
    fn test_add_history_and_flush() {
        let mut storage = HistoriesStorage::new();
        let gauge = Gauge { name: "p", value: 1.0 };
        storage.register_object(&gauge).unwrap();
        storage.add_history("sim_time", 0.0);
        storage.add_history("sim_time", 0.5);
        storage.update_histories([&gauge as &dyn Trackable]).unwrap();

        assert_eq!(storage.history("sim_time"), Some(&[0.0, 0.5][..]));
        assert_eq!(storage.snapshot().point_count(), 2);

        storage.flush();
        assert!(storage.lengths().values().all(|&len| len == 0));
        storage.update_histories([&gauge as &dyn Trackable]).unwrap();
        assert_eq!(storage.history("p_a"), Some(&[1.0][..]));
    }
}
