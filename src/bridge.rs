use crate::QueryError;
use crate::template::DocumentStream;
use futures::StreamExt;
use std::fmt;
use std::future::Future;
use std::iter::FusedIterator;
use std::sync::Arc;
use tokio::runtime::{Handle, Runtime, RuntimeFlavor};
use tracing::warn;

/// Runs asynchronous query pipelines to completion on the calling thread.
///
/// `block_on` is the only suspension point of the blocking API. Outside any
/// runtime, and on the blocking-pool threads of any runtime, it blocks on the
/// bridge's handle; inside a multi-thread runtime it first moves the worker
/// off the scheduler with `block_in_place`. On the thread driving a
/// current-thread runtime (its `block_on` future or one of its tasks) it
/// refuses with [`QueryError::BlockingNotSupported`], as that thread is the
/// only one able to drive the pipeline.
///
/// Dropping the future, for instance when the caller unwinds, cancels the
/// pipeline.
#[derive(Debug, Clone)]
pub struct BlockingBridge {
    handle: Handle,
    // Keeps an owned runtime alive for as long as any clone of the bridge.
    _runtime: Option<Arc<Runtime>>,
}

impl BlockingBridge {
    pub fn new(handle: Handle) -> Self {
        Self {
            handle,
            _runtime: None,
        }
    }

    /// Bridge onto the runtime the caller is currently running in.
    pub fn current() -> Result<Self, QueryError> {
        Handle::try_current()
            .map(Self::new)
            .map_err(QueryError::unexpected)
    }

    /// Bridge owning a dedicated multi-thread runtime.
    ///
    /// The last clone must not be dropped from within an asynchronous
    /// context, as tokio forbids shutting a runtime down there.
    pub fn with_runtime() -> Result<Self, QueryError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .map_err(QueryError::unexpected)?;
        Ok(Self {
            handle: runtime.handle().clone(),
            _runtime: Some(Arc::new(runtime)),
        })
    }

    pub fn handle(&self) -> &Handle {
        &self.handle
    }

    pub fn block_on<F, T>(&self, future: F) -> Result<T, QueryError>
    where
        F: Future<Output = Result<T, QueryError>>,
    {
        match Handle::try_current() {
            Err(_) => self.handle.block_on(future),
            Ok(current) => match current.runtime_flavor() {
                RuntimeFlavor::MultiThread => {
                    tokio::task::block_in_place(|| self.handle.block_on(future))
                }
                flavor => {
                    if drives_runtime() {
                        warn!(?flavor, "Refusing to block the thread driving the runtime");
                        Err(QueryError::BlockingNotSupported)
                    } else {
                        self.handle.block_on(future)
                    }
                }
            },
        }
    }

    pub fn stream<T>(&self, stream: DocumentStream<T>) -> BlockingStream<T> {
        BlockingStream {
            bridge: self.clone(),
            stream: Some(stream),
        }
    }
}

/// Whether the calling thread is driving a current-thread runtime.
///
/// tokio only exposes this through `block_in_place`, which is a no-op on
/// blocking-pool threads and panics on a runtime-driving thread. The panic
/// is raised before any state is touched.
fn drives_runtime() -> bool {
    std::panic::catch_unwind(|| tokio::task::block_in_place(|| ())).is_err()
}

/// Pull-based iterator over an asynchronous result stream.
///
/// Each `next()` blocks until the pipeline yields one more item, so results
/// are never accumulated. The iterator is single pass and stays exhausted
/// once it has returned `None`.
pub struct BlockingStream<T> {
    bridge: BlockingBridge,
    stream: Option<DocumentStream<T>>,
}

impl<T> Iterator for BlockingStream<T> {
    type Item = Result<T, QueryError>;

    fn next(&mut self) -> Option<Self::Item> {
        let stream = self.stream.as_mut()?;
        let next = self
            .bridge
            .block_on(async { Ok::<_, QueryError>(stream.next().await) });
        match next {
            Ok(Some(item)) => Some(item),
            Ok(None) => {
                self.stream = None;
                None
            }
            Err(e) => {
                self.stream = None;
                Some(Err(e))
            }
        }
    }
}

impl<T> FusedIterator for BlockingStream<T> {}

impl<T> fmt::Debug for BlockingStream<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockingStream")
            .field("bridge", &self.bridge)
            .field("exhausted", &self.stream.is_none())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbers(count: u32) -> DocumentStream<u32> {
        Box::pin(futures::stream::iter((0..count).map(Ok)))
    }

    #[test]
    fn test_block_on_outside_runtime() {
        let bridge = BlockingBridge::with_runtime().unwrap();
        let value = bridge.block_on(async { Ok::<_, QueryError>(21 * 2) }).unwrap();
        assert_eq!(value, 42);
    }

    #[test]
    fn test_block_on_passes_errors_through() {
        let bridge = BlockingBridge::with_runtime().unwrap();
        let err = bridge
            .block_on(async { Err::<(), _>(QueryError::NoMatchingDocument) })
            .unwrap_err();
        assert!(matches!(err, QueryError::NoMatchingDocument));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_block_on_inside_multi_thread_runtime() {
        let bridge = BlockingBridge::current().unwrap();
        let value = bridge.block_on(async { Ok::<_, QueryError>("done") }).unwrap();
        assert_eq!(value, "done");
    }

    #[tokio::test]
    async fn test_block_on_refused_on_current_thread_runtime() {
        let bridge = BlockingBridge::current().unwrap();
        let err = bridge.block_on(async { Ok::<_, QueryError>(()) }).unwrap_err();
        assert!(matches!(err, QueryError::BlockingNotSupported));
    }

    #[tokio::test]
    async fn test_block_on_from_blocking_thread_of_current_thread_runtime() {
        let bridge = BlockingBridge::current().unwrap();
        let value = tokio::task::spawn_blocking(move || {
            bridge.block_on(async { Ok::<_, QueryError>(7) })
        })
        .await
        .unwrap()
        .unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn test_block_on_refused_inside_current_thread_task() {
        let bridge = BlockingBridge::current().unwrap();
        let result = tokio::spawn(async move { bridge.block_on(async { Ok::<_, QueryError>(()) }) })
            .await
            .unwrap();
        assert!(matches!(result, Err(QueryError::BlockingNotSupported)));
    }

    #[test]
    fn test_current_without_runtime_fails() {
        assert!(matches!(
            BlockingBridge::current(),
            Err(QueryError::UnexpectedError(_))
        ));
    }

    #[test]
    fn test_stream_is_lazy_and_single_pass() {
        let bridge = BlockingBridge::with_runtime().unwrap();
        let mut iter = bridge.stream(numbers(3));
        assert_eq!(iter.next().unwrap().unwrap(), 0);
        let rest: Vec<u32> = iter.by_ref().map(Result::unwrap).collect();
        assert_eq!(rest, vec![1, 2]);
        assert!(iter.next().is_none());
        assert!(format!("{iter:?}").contains("exhausted: true"));
    }
}
