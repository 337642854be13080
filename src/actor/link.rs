//! Link Actor: dedicated thread running the command dispatcher.
//!
//! The thread blocks on link reads and the window handshake only; both
//! give up once the running flag is cleared.

use crate::dispatch::Dispatcher;
use crate::error::Result;
use std::io::{self, Read, Write};
use std::thread::{self, JoinHandle};

/// Link actor handle.
pub struct LinkActor {
    /// Handle to the link thread; yields the dispatcher's final result.
    handle: Option<JoinHandle<Result<()>>>,
}

impl LinkActor {
    /// Spawn the link thread around `dispatcher`.
    ///
    /// # Errors
    ///
    /// Returns an error if the thread cannot be spawned.
    pub fn spawn<T>(mut dispatcher: Dispatcher<T>) -> io::Result<Self>
    where
        T: Read + Write + Send + 'static,
    {
        let handle = thread::Builder::new()
            .name("spritelink-link".to_string())
            .spawn(move || {
                let result = dispatcher.run();
                // Whatever ended the dispatcher ends the render actor too
                dispatcher.link().stop();
                tracing::debug!(
                    bytes_in = dispatcher.link().bytes_in(),
                    bytes_out = dispatcher.link().bytes_out(),
                    commands = dispatcher.executed(),
                    "link thread exiting"
                );
                result
            })?;

        Ok(Self {
            handle: Some(handle),
        })
    }

    /// Whether the thread has finished.
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Wait for the link thread and return the dispatcher's result.
    pub fn join(mut self) -> Result<()> {
        match self.handle.take() {
            Some(handle) => handle
                .join()
                .unwrap_or_else(|_| Err(io::Error::new(io::ErrorKind::Other, "link thread panicked").into())),
            None => Ok(()),
        }
    }
}

impl std::fmt::Debug for LinkActor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkActor")
            .field("finished", &self.is_finished())
            .finish()
    }
}
