//! An in-memory database implementing the full session contracts.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;

use unidal_core::{
    Condition, Context, DalError, DalResult, Deleter, Getter, IdKind, IdValue, InsertOptions,
    Inserter, Key, MultiDeleter, MultiGetter, MultiSetter, MultiUpdater, Operator, Precondition,
    Reader, Record, RoTxWorker, RwTxWorker, Select, Selector, Setter, Transaction,
    TransactionCoordinator, TransactionOptions, Update, Updater, Upserter,
};

use crate::readers::RecordsReader;

/// Collection path -> identifier -> stored payload.
type Collections = BTreeMap<String, BTreeMap<String, Value>>;

/// An in-memory database for tests.
///
/// Implements every capability trait plus the transaction coordinator,
/// so it satisfies the full [`Database`](unidal_core::Database)
/// contract. Select supports equality and ordering comparisons over
/// object payloads; results come back in identifier order. Transactions
/// provide scoping, not isolation: writes apply immediately.
#[derive(Clone, Default)]
pub struct MemoryDb {
    collections: Arc<RwLock<Collections>>,
}

impl MemoryDb {
    /// Creates an empty in-memory database.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records stored in the given collection path.
    #[must_use]
    pub fn len(&self, collection: &str) -> usize {
        self.collections
            .read()
            .get(collection)
            .map_or(0, BTreeMap::len)
    }

    /// Whether the given collection path holds no records.
    #[must_use]
    pub fn is_empty(&self, collection: &str) -> bool {
        self.len(collection) == 0
    }
}

/// Splits a key into its collection path and identifier.
fn storage_path(key: &Key) -> (String, String) {
    let id = key.id().to_string();
    let collection = match key.parent() {
        Some(parent) => format!("{parent}/{}", key.kind()),
        None => key.kind().to_owned(),
    };
    (collection, id)
}

fn parse_id(raw: &str, kind: IdKind) -> DalResult<IdValue> {
    match kind {
        IdKind::String => Ok(IdValue::String(raw.to_owned())),
        IdKind::Int => raw.parse::<i64>().map(IdValue::Int).map_err(|err| {
            DalError::backend(format!("stored id '{raw}' is not an integer: {err}"))
        }),
        IdKind::Composite => Err(DalError::backend(
            "composite ids are not supported by the in-memory database",
        )),
    }
}

fn matches(condition: &Condition, data: &Value) -> DalResult<bool> {
    match condition {
        Condition::Comparison(comparison) => {
            let left = data.get(&comparison.field).unwrap_or(&Value::Null);
            compare(left, comparison.operator, &comparison.value)
        }
        Condition::Group(group) => match group.operator {
            Operator::And => {
                for child in &group.conditions {
                    if !matches(child, data)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Operator::Or => {
                for child in &group.conditions {
                    if matches(child, data)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            other => Err(DalError::backend(format!(
                "unsupported group operator: {other}"
            ))),
        },
    }
}

fn compare(left: &Value, operator: Operator, right: &Value) -> DalResult<bool> {
    match operator {
        Operator::Equal => Ok(left == right),
        Operator::NotEqual => Ok(left != right),
        Operator::In => Ok(right.as_array().is_some_and(|values| values.contains(left))),
        Operator::LessThan
        | Operator::LessOrEqual
        | Operator::GreaterThan
        | Operator::GreaterOrEqual => {
            let ordering = order_values(left, right).ok_or_else(|| {
                DalError::backend(format!("values {left} and {right} are not comparable"))
            })?;
            Ok(match operator {
                Operator::LessThan => ordering.is_lt(),
                Operator::LessOrEqual => ordering.is_le(),
                Operator::GreaterThan => ordering.is_gt(),
                _ => ordering.is_ge(),
            })
        }
        Operator::And | Operator::Or => Err(DalError::backend(
            "grouping operator used in a comparison",
        )),
    }
}

fn order_values(left: &Value, right: &Value) -> Option<std::cmp::Ordering> {
    if let (Some(left), Some(right)) = (left.as_f64(), right.as_f64()) {
        return left.partial_cmp(&right);
    }
    if let (Some(left), Some(right)) = (left.as_str(), right.as_str()) {
        return Some(left.cmp(right));
    }
    None
}

impl Getter for MemoryDb {
    fn get(&self, _ctx: &Context, record: &mut Record) -> DalResult<()> {
        let (collection, id) = storage_path(record.key());
        let stored = self
            .collections
            .read()
            .get(&collection)
            .and_then(|entries| entries.get(&id))
            .cloned();
        match stored {
            Some(value) => {
                record.set_data(value);
                record.set_result(Ok(()));
            }
            None => {
                let absent = DalError::record_not_found(record.key());
                record.set_result(Err(absent));
            }
        }
        Ok(())
    }
}

impl MultiGetter for MemoryDb {
    fn get_multi(&self, ctx: &Context, records: &mut [Record]) -> DalResult<()> {
        for record in records.iter_mut() {
            self.get(ctx, record)?;
        }
        Ok(())
    }
}

impl Selector for MemoryDb {
    fn select(&self, _ctx: &Context, query: &Select) -> DalResult<Box<dyn Reader>> {
        let from = query
            .from
            .as_ref()
            .ok_or_else(|| DalError::backend("select requires a source collection"))?;
        let rows: Vec<(String, Value)> = self
            .collections
            .read()
            .get(&from.path())
            .map(|entries| {
                entries
                    .iter()
                    .map(|(id, value)| (id.clone(), value.clone()))
                    .collect()
            })
            .unwrap_or_default();

        let mut records = Vec::new();
        for (id, value) in rows {
            if let Some(filter) = &query.filter {
                if !matches(filter, &value)? {
                    continue;
                }
            }
            let id = parse_id(&id, query.id_kind)?;
            let mut record = match &query.into {
                Some(factory) => {
                    let mut record = factory();
                    record.set_id(id);
                    record
                }
                None => {
                    let mut builder = Key::builder(from.name.clone()).id(id);
                    if let Some(parent) = &from.parent {
                        builder = builder.parent(parent.clone());
                    }
                    Record::new(builder.build())
                }
            };
            record.set_data(value);
            record.set_result(Ok(()));
            records.push(record);
        }

        if query.offset > 0 {
            if let Ok(offset) = usize::try_from(query.offset) {
                records.drain(..offset.min(records.len()));
            }
        }
        if query.limit > 0 {
            if let Ok(limit) = usize::try_from(query.limit) {
                records.truncate(limit);
            }
        }
        Ok(Box::new(RecordsReader::new(records)))
    }
}

impl Inserter for MemoryDb {
    fn insert(&self, ctx: &Context, record: &mut Record, options: InsertOptions) -> DalResult<()> {
        if let Some(generator) = options.id_generator() {
            generator(ctx, record)?;
        }
        let (collection, id) = storage_path(record.key());
        let mut collections = self.collections.write();
        let entries = collections.entry(collection).or_default();
        if entries.contains_key(&id) {
            return Err(DalError::backend(format!(
                "record already exists: {}",
                record.key()
            )));
        }
        // The outcome is marked before reading the payload; data() is
        // only readable on a populated record.
        record.set_result(Ok(()));
        entries.insert(id, record.data().clone());
        Ok(())
    }
}

impl Upserter for MemoryDb {
    fn upsert(&self, _ctx: &Context, record: &mut Record) -> DalResult<()> {
        let (collection, id) = storage_path(record.key());
        record.set_result(Ok(()));
        self.collections
            .write()
            .entry(collection)
            .or_default()
            .insert(id, record.data().clone());
        Ok(())
    }
}

impl Setter for MemoryDb {
    fn set(&self, ctx: &Context, record: &mut Record) -> DalResult<()> {
        self.upsert(ctx, record)
    }
}

impl MultiSetter for MemoryDb {
    fn set_multi(&self, ctx: &Context, records: &mut [Record]) -> DalResult<()> {
        for record in records.iter_mut() {
            self.set(ctx, record)?;
        }
        Ok(())
    }
}

impl Updater for MemoryDb {
    fn update(
        &self,
        _ctx: &Context,
        key: &Key,
        updates: &[Update],
        _preconditions: &[Precondition],
    ) -> DalResult<()> {
        let (collection, id) = storage_path(key);
        let mut collections = self.collections.write();
        let stored = collections
            .get_mut(&collection)
            .and_then(|entries| entries.get_mut(&id));
        let Some(stored) = stored else {
            return Err(DalError::wrap(
                format!("failed to update {key}"),
                DalError::record_not_found(key),
            ));
        };
        let Value::Object(map) = stored else {
            return Err(DalError::backend(format!("record {key} is not an object")));
        };
        for update in updates {
            map.insert(update.field.clone(), update.value.clone());
        }
        Ok(())
    }
}

impl MultiUpdater for MemoryDb {
    fn update_multi(
        &self,
        ctx: &Context,
        keys: &[Key],
        updates: &[Update],
        preconditions: &[Precondition],
    ) -> DalResult<()> {
        for key in keys {
            self.update(ctx, key, updates, preconditions)?;
        }
        Ok(())
    }
}

impl Deleter for MemoryDb {
    fn delete(&self, _ctx: &Context, key: &Key) -> DalResult<()> {
        let (collection, id) = storage_path(key);
        if let Some(entries) = self.collections.write().get_mut(&collection) {
            entries.remove(&id);
        }
        Ok(())
    }
}

impl MultiDeleter for MemoryDb {
    fn delete_multi(&self, ctx: &Context, keys: &[Key]) -> DalResult<()> {
        for key in keys {
            self.delete(ctx, key)?;
        }
        Ok(())
    }
}

/// A transaction over a [`MemoryDb`].
///
/// Operations delegate straight to the database; the double scopes the
/// transaction through the context without buffering writes.
pub struct MemoryTransaction {
    db: MemoryDb,
    options: TransactionOptions,
}

impl Transaction for MemoryTransaction {
    fn options(&self) -> &TransactionOptions {
        &self.options
    }
}

impl Getter for MemoryTransaction {
    fn get(&self, ctx: &Context, record: &mut Record) -> DalResult<()> {
        self.db.get(ctx, record)
    }
}

impl MultiGetter for MemoryTransaction {
    fn get_multi(&self, ctx: &Context, records: &mut [Record]) -> DalResult<()> {
        self.db.get_multi(ctx, records)
    }
}

impl Selector for MemoryTransaction {
    fn select(&self, ctx: &Context, query: &Select) -> DalResult<Box<dyn Reader>> {
        self.db.select(ctx, query)
    }
}

impl Inserter for MemoryTransaction {
    fn insert(&self, ctx: &Context, record: &mut Record, options: InsertOptions) -> DalResult<()> {
        self.db.insert(ctx, record, options)
    }
}

impl Upserter for MemoryTransaction {
    fn upsert(&self, ctx: &Context, record: &mut Record) -> DalResult<()> {
        self.db.upsert(ctx, record)
    }
}

impl Setter for MemoryTransaction {
    fn set(&self, ctx: &Context, record: &mut Record) -> DalResult<()> {
        self.db.set(ctx, record)
    }
}

impl MultiSetter for MemoryTransaction {
    fn set_multi(&self, ctx: &Context, records: &mut [Record]) -> DalResult<()> {
        self.db.set_multi(ctx, records)
    }
}

impl Updater for MemoryTransaction {
    fn update(
        &self,
        ctx: &Context,
        key: &Key,
        updates: &[Update],
        preconditions: &[Precondition],
    ) -> DalResult<()> {
        self.db.update(ctx, key, updates, preconditions)
    }
}

impl MultiUpdater for MemoryTransaction {
    fn update_multi(
        &self,
        ctx: &Context,
        keys: &[Key],
        updates: &[Update],
        preconditions: &[Precondition],
    ) -> DalResult<()> {
        self.db.update_multi(ctx, keys, updates, preconditions)
    }
}

impl Deleter for MemoryTransaction {
    fn delete(&self, ctx: &Context, key: &Key) -> DalResult<()> {
        self.db.delete(ctx, key)
    }
}

impl MultiDeleter for MemoryTransaction {
    fn delete_multi(&self, ctx: &Context, keys: &[Key]) -> DalResult<()> {
        self.db.delete_multi(ctx, keys)
    }
}

impl TransactionCoordinator for MemoryDb {
    fn run_readonly_transaction(
        &self,
        ctx: &Context,
        worker: &mut RoTxWorker<'_>,
        options: TransactionOptions,
    ) -> DalResult<()> {
        let tx = Arc::new(MemoryTransaction {
            db: self.clone(),
            options: options.readonly(),
        });
        let tx_ctx = ctx.with_transaction(tx.clone());
        worker(&tx_ctx, tx.as_ref())
    }

    fn run_readwrite_transaction(
        &self,
        ctx: &Context,
        worker: &mut RwTxWorker<'_>,
        options: TransactionOptions,
    ) -> DalResult<()> {
        let tx = Arc::new(MemoryTransaction {
            db: self.clone(),
            options,
        });
        let tx_ctx = ctx.with_transaction(tx.clone());
        worker(&tx_ctx, tx.as_ref())
    }
}
