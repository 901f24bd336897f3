//! Per-record transform stages built from a mapping function.
//!
//! The mapping function is called once per incoming record, strictly one
//! record at a time and in arrival order; the next record is not pulled until
//! the previous call has completed and its output has been emitted. Each call
//! decides what goes downstream with a [`Mapped`] value:
//!
//! - [`Mapped::Keep`] emits exactly one record,
//! - [`Mapped::Drop`] emits nothing,
//! - [`Mapped::Expand`] emits each record of the list, in list order.
//!
//! An `Err` from the mapping function ends the stage with
//! [`Error::Transform`]; no further records are processed.

use std::collections::VecDeque;
use std::future::Future;

use futures::stream::{self, StreamExt};

use crate::error::{BoxError, Error};
use crate::stream::{Record, RecordStream, Transform};

/// What a mapping function produced for one input record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mapped {
    Keep(Record),
    Drop,
    Expand(Vec<Record>),
}

impl From<Record> for Mapped {
    fn from(record: Record) -> Self {
        Mapped::Keep(record)
    }
}

impl From<Option<Record>> for Mapped {
    fn from(record: Option<Record>) -> Self {
        record.map_or(Mapped::Drop, Mapped::Keep)
    }
}

impl From<Vec<Record>> for Mapped {
    fn from(records: Vec<Record>) -> Self {
        Mapped::Expand(records)
    }
}

/// A [`Transform`] driven by a mapping function; see [`make_transform`].
pub struct RecordTransform<F> {
    map_fn: F,
}

/// Wrap `map_fn` into a transform stage.
///
/// # Example
///
/// ```rust,ignore
/// use feature_stream::{make_transform, pipe, Mapped};
///
/// // Drop empty records, keep the rest.
/// let stage = make_transform(|record| async move {
///     Ok::<_, std::io::Error>(if record.is_empty() { Mapped::Drop } else { Mapped::Keep(record) })
/// });
/// let filtered = pipe(registry.from("in.json", &options)?, stage);
/// ```
pub fn make_transform<F, Fut, E>(map_fn: F) -> RecordTransform<F>
where
    F: FnMut(Record) -> Fut + Send + 'static,
    Fut: Future<Output = Result<Mapped, E>> + Send + 'static,
    E: Into<BoxError> + Send + 'static,
{
    RecordTransform { map_fn }
}

struct MapState<F> {
    input: RecordStream,
    map_fn: F,
    queued: VecDeque<Record>,
    finished: bool,
}

impl<F, Fut, E> Transform for RecordTransform<F>
where
    F: FnMut(Record) -> Fut + Send + 'static,
    Fut: Future<Output = Result<Mapped, E>> + Send + 'static,
    E: Into<BoxError> + Send + 'static,
{
    fn apply(self: Box<Self>, input: RecordStream) -> RecordStream {
        let state = MapState {
            input,
            map_fn: self.map_fn,
            queued: VecDeque::new(),
            finished: false,
        };
        stream::unfold(state, |mut state| async move {
            loop {
                if let Some(record) = state.queued.pop_front() {
                    return Some((Ok(record), state));
                }
                if state.finished {
                    return None;
                }
                let record = match state.input.next().await {
                    Some(Ok(record)) => record,
                    Some(Err(e)) => {
                        state.finished = true;
                        return Some((Err(e), state));
                    }
                    None => return None,
                };
                match (state.map_fn)(record).await {
                    Ok(Mapped::Keep(record)) => return Some((Ok(record), state)),
                    Ok(Mapped::Drop) => {}
                    Ok(Mapped::Expand(records)) => state.queued.extend(records),
                    Err(e) => {
                        state.finished = true;
                        return Some((Err(Error::Transform(e.into())), state));
                    }
                }
            }
        })
        .boxed()
    }
}
