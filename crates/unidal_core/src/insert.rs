//! Insert options and the bounded generate-check-insert loop.
//!
//! Storage backends rarely offer an atomic "insert if absent" for
//! caller-generated identifiers. [`insert_with_random_id`] makes
//! identifier collision probabilistic-but-bounded instead: generate a
//! candidate, check existence, insert on the first free identifier,
//! give up after a configured number of attempts.

use std::fmt;
use std::sync::Arc;

use rand::distributions::Alphanumeric;
use rand::Rng;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::context::Context;
use crate::error::{DalError, DalResult};
use crate::key::{IdValue, Key};
use crate::record::Record;

/// Contract for an identifier generator: mutates the record's key
/// identifier or fails.
pub type IdGenerator = dyn Fn(&Context, &mut Record) -> DalResult<()> + Send + Sync;

/// Options for an insert operation.
#[derive(Clone, Default)]
pub struct InsertOptions {
    id_generator: Option<Arc<IdGenerator>>,
}

impl InsertOptions {
    /// Creates empty insert options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches an identifier generator the driver runs before
    /// inserting.
    #[must_use]
    pub fn with_id_generator(mut self, generator: Arc<IdGenerator>) -> Self {
        self.id_generator = Some(generator);
        self
    }

    /// The attached identifier generator, if any.
    #[must_use]
    pub fn id_generator(&self) -> Option<&Arc<IdGenerator>> {
        self.id_generator.as_ref()
    }
}

impl fmt::Debug for InsertOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InsertOptions")
            .field("id_generator", &self.id_generator.as_ref().map(|_| "<generator>"))
            .finish()
    }
}

/// Configuration for the random-string identifier generator.
#[derive(Debug, Clone, Default)]
pub struct RandomStringId {
    length: usize,
    prefix: String,
}

impl RandomStringId {
    /// A generator configuration producing identifiers of `length`
    /// random alphanumeric characters.
    #[must_use]
    pub fn new(length: usize) -> Self {
        Self {
            length,
            prefix: String::new(),
        }
    }

    /// Prepends a fixed prefix to every generated identifier.
    #[must_use]
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Finishes the configuration into a generator.
    #[must_use]
    pub fn generator(self) -> Arc<IdGenerator> {
        Arc::new(move |_ctx, record| {
            let suffix: String = rand::thread_rng()
                .sample_iter(&Alphanumeric)
                .take(self.length)
                .map(char::from)
                .collect();
            record.set_id(IdValue::String(format!("{}{suffix}", self.prefix)));
            Ok(())
        })
    }
}

/// A generator assigning random alphanumeric string identifiers of the
/// given length.
#[must_use]
pub fn random_string_id(length: usize) -> Arc<IdGenerator> {
    RandomStringId::new(length).generator()
}

/// A generator assigning random UUID (v4) string identifiers.
#[must_use]
pub fn random_uuid_id() -> Arc<IdGenerator> {
    Arc::new(|_ctx, record| {
        record.set_id(IdValue::String(Uuid::new_v4().to_string()));
        Ok(())
    })
}

/// Inserts a record under a generated, collision-free identifier.
///
/// For each attempt up to `attempts`: run `generate_id` against a
/// throwaway view of the target's key slot (a probe never touches the
/// caller's payload), then probe `exists`. `Ok` from `exists` means the
/// identifier is taken; a not-found error means it is free, so the real
/// insert runs with the generated identifier on `record`; any other
/// error aborts, wrapped with context. Exhausting the attempt budget
/// fails with [`DalError::UniqueIdExhausted`].
///
/// Attempts are strictly sequential: each depends on the existence
/// outcome of the previous identifier choice.
pub fn insert_with_random_id(
    ctx: &Context,
    record: &mut Record,
    generate_id: &IdGenerator,
    attempts: u32,
    mut exists: impl FnMut(&Key) -> DalResult<()>,
    mut insert: impl FnMut(&mut Record) -> DalResult<()>,
) -> DalResult<()> {
    let mut scratch = Record::new_unchecked(record.key().clone());
    for attempt in 1..=attempts {
        generate_id(ctx, &mut scratch)
            .map_err(|err| DalError::wrap("failed to generate a random id", err))?;
        match exists(scratch.key()) {
            Ok(()) => {
                debug!(attempt, kind = scratch.key().kind(), "generated id is taken");
            }
            Err(err) if err.is_not_found() => {
                record.set_id(scratch.key().id().clone());
                return insert(record);
            }
            Err(err) => {
                return Err(DalError::wrap("failed to check if record exists", err));
            }
        }
    }
    warn!(
        attempts,
        kind = record.key().kind(),
        "could not generate a unique id"
    );
    Err(DalError::UniqueIdExhausted { attempts })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn target_record() -> Record {
        Record::with_data(
            Key::with_string_id("users", "placeholder"),
            json!({"email": "a@b.c"}),
        )
    }

    #[test]
    fn inserts_on_first_free_id() {
        use std::sync::atomic::{AtomicU32, Ordering};

        let ctx = Context::background();
        let mut record = target_record();

        let generated = Arc::new(AtomicU32::new(0));
        let observed = generated.clone();
        let generator: Arc<IdGenerator> = Arc::new(move |_ctx, record| {
            generated.fetch_add(1, Ordering::SeqCst);
            record.set_id(IdValue::String("generated".into()));
            Ok(())
        });

        let mut probes = 0;
        let mut inserts = 0;
        insert_with_random_id(
            &ctx,
            &mut record,
            &*generator,
            5,
            |_key| {
                probes += 1;
                if probes < 3 {
                    Ok(()) // taken
                } else {
                    Err(DalError::record_not_found("users/generated"))
                }
            },
            |_record| {
                inserts += 1;
                Ok(())
            },
        )
        .unwrap();

        assert_eq!(observed.load(Ordering::SeqCst), 3);
        assert_eq!(probes, 3);
        assert_eq!(inserts, 1);
        assert_eq!(record.key().id(), &IdValue::String("generated".into()));
    }

    #[test]
    fn exhausts_attempts_without_inserting() {
        let ctx = Context::background();
        let mut record = target_record();
        let generator = random_string_id(8);

        let mut inserts = 0;
        let err = insert_with_random_id(
            &ctx,
            &mut record,
            &*generator,
            2,
            |_key| Ok(()), // every id is taken
            |_record| {
                inserts += 1;
                Ok(())
            },
        )
        .unwrap_err();

        assert!(matches!(err, DalError::UniqueIdExhausted { attempts: 2 }));
        assert_eq!(inserts, 0);
    }

    #[test]
    fn hard_existence_failure_aborts_wrapped() {
        let ctx = Context::background();
        let mut record = target_record();
        let generator = random_string_id(8);

        let err = insert_with_random_id(
            &ctx,
            &mut record,
            &*generator,
            5,
            |_key| Err(DalError::backend("connection reset")),
            |_record| Ok(()),
        )
        .unwrap_err();

        assert!(matches!(err, DalError::Context { .. }));
        assert!(!err.is_not_found());
    }

    #[test]
    fn probes_never_touch_the_target_payload() {
        let ctx = Context::background();
        let mut record = target_record();
        let generator: Arc<IdGenerator> = Arc::new(|_ctx, record| {
            // A misbehaving generator scribbling on its record only
            // ever sees the throwaway view.
            record.set_data(json!("scratch"));
            record.set_id(IdValue::String("id1".into()));
            Ok(())
        });

        insert_with_random_id(
            &ctx,
            &mut record,
            &*generator,
            1,
            |_key| Err(DalError::record_not_found("users/id1")),
            |record| {
                record.set_result(Ok(()));
                Ok(())
            },
        )
        .unwrap();

        assert_eq!(record.data(), &json!({"email": "a@b.c"}));
        assert_eq!(record.key().id(), &IdValue::String("id1".into()));
    }

    #[test]
    fn random_string_ids_have_length_and_prefix() {
        let ctx = Context::background();
        let generator = RandomStringId::new(5).prefix("usr_").generator();
        let mut record = Record::new(Key::with_string_id("users", "x"));
        generator(&ctx, &mut record).unwrap();
        match record.key().id() {
            IdValue::String(id) => {
                assert!(id.starts_with("usr_"));
                assert_eq!(id.len(), "usr_".len() + 5);
            }
            other => panic!("expected a string id, got {other:?}"),
        }
    }

    #[test]
    fn uuid_ids_parse_back() {
        let ctx = Context::background();
        let generator = random_uuid_id();
        let mut record = Record::new(Key::with_string_id("users", "x"));
        generator(&ctx, &mut record).unwrap();
        match record.key().id() {
            IdValue::String(id) => {
                assert!(Uuid::parse_str(id).is_ok());
            }
            other => panic!("expected a string id, got {other:?}"),
        }
    }
}
