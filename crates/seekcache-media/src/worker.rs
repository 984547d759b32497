//! A reader pinned to its own decode thread.
//!
//! Platform decoders are usually bound to the thread that created them. The
//! handle builds the decoder on a dedicated worker thread and marshals every
//! request there, so any number of threads can share one reader while the
//! decoder itself never leaves its thread.

use crate::config::ReaderConfig;
use crate::decoder::{Decoder, StreamSelection};
use crate::info::MediaInfo;
use crate::reader::DecodeCacheReader;
use crate::stats::ReaderStats;
use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use parking_lot::Mutex;
use seekcache_core::{Result, SeekCacheError};
use std::sync::Arc;
use std::thread::{self, JoinHandle, ThreadId};
use tracing::{debug, info, warn};

/// Name given to decode worker threads.
pub const WORKER_THREAD_NAME: &str = "seekcache-decode";

type Job<D> = Box<dyn FnOnce(&mut DecodeCacheReader<D>) + Send>;

/// Messages processed by the worker, in order.
enum Command<D: Decoder> {
    /// Run a job against the reader
    Run(Job<D>),
    /// Drop the reader and exit the thread
    Shutdown,
}

/// Thread-safe handle to a [`DecodeCacheReader`] owned by a worker thread.
///
/// Requests from different threads are served one at a time in arrival
/// order. Dropping the handle finishes the queued requests, then drops the
/// reader on its own thread.
pub struct ReaderHandle<D: Decoder + 'static> {
    commands: Sender<Command<D>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    worker_id: ThreadId,
    info: Arc<MediaInfo>,
}

impl<D: Decoder + 'static> ReaderHandle<D> {
    /// Start a worker thread, build the decoder there with `factory` and open
    /// a reader over it.
    ///
    /// Returns once the reader is open, with the error that prevented it
    /// otherwise.
    pub fn spawn<F>(factory: F, selection: StreamSelection, config: ReaderConfig) -> Result<Self>
    where
        F: FnOnce() -> Result<D> + Send + 'static,
    {
        let (command_tx, command_rx) = unbounded::<Command<D>>();
        let (ready_tx, ready_rx) = bounded::<Result<Arc<MediaInfo>>>(1);

        let worker = thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || {
                let opened = factory()
                    .and_then(|decoder| DecodeCacheReader::open(decoder, selection, config));
                let mut reader = match opened {
                    Ok(reader) => {
                        let _ = ready_tx.send(Ok(reader.info()));
                        reader
                    }
                    Err(err) => {
                        let _ = ready_tx.send(Err(err));
                        return;
                    }
                };
                Self::worker_loop(&mut reader, &command_rx);
            })?;

        let ready = ready_rx.recv();
        let info = match ready {
            Ok(Ok(info)) => info,
            Ok(Err(err)) => {
                let _ = worker.join();
                return Err(err);
            }
            Err(_) => {
                let _ = worker.join();
                return Err(SeekCacheError::WorkerGone);
            }
        };

        let worker_id = worker.thread().id();
        info!(?worker_id, "decode worker started");
        Ok(Self {
            commands: command_tx,
            worker: Mutex::new(Some(worker)),
            worker_id,
            info,
        })
    }

    fn worker_loop(reader: &mut DecodeCacheReader<D>, commands: &Receiver<Command<D>>) {
        while let Ok(command) = commands.recv() {
            match command {
                Command::Run(job) => job(reader),
                Command::Shutdown => break,
            }
        }
        debug!("decode worker stopping");
    }

    /// Run `job` against the reader on the worker thread and wait for its
    /// result.
    ///
    /// Fails with [`SeekCacheError::Reentrant`] when called from the worker
    /// itself, and with [`SeekCacheError::WorkerGone`] once the worker has
    /// exited.
    pub fn run<R, F>(&self, job: F) -> Result<R>
    where
        R: Send + 'static,
        F: FnOnce(&mut DecodeCacheReader<D>) -> R + Send + 'static,
    {
        if thread::current().id() == self.worker_id {
            return Err(SeekCacheError::Reentrant);
        }

        let (reply_tx, reply_rx) = bounded(1);
        let job: Job<D> = Box::new(move |reader| {
            let _ = reply_tx.send(job(reader));
        });
        self.commands
            .send(Command::Run(job))
            .map_err(|_| SeekCacheError::WorkerGone)?;
        reply_rx.recv().map_err(|_| SeekCacheError::WorkerGone)
    }

    /// [`DecodeCacheReader::read_frame`] on the worker thread.
    pub fn read_frame(&self, frame: i64, dest: &mut [u8]) -> bool {
        let len = dest.len();
        let reply = self.run(move |reader| {
            let mut buffer = vec![0u8; len];
            let ok = reader.read_frame(frame, &mut buffer);
            (ok, buffer)
        });
        Self::deliver(reply, dest)
    }

    /// [`DecodeCacheReader::read_audio`] on the worker thread.
    pub fn read_audio(&self, start: i64, length: i64, dest: &mut [u8]) -> bool {
        let len = dest.len();
        let reply = self.run(move |reader| {
            let mut buffer = vec![0u8; len];
            let ok = reader.read_audio(start, length, &mut buffer);
            (ok, buffer)
        });
        Self::deliver(reply, dest)
    }

    fn deliver(reply: Result<(bool, Vec<u8>)>, dest: &mut [u8]) -> bool {
        match reply {
            Ok((true, buffer)) => {
                dest.copy_from_slice(&buffer);
                true
            }
            Ok((false, _)) => false,
            Err(err) => {
                warn!(%err, "request not served");
                false
            }
        }
    }

    pub fn stats(&self) -> Result<ReaderStats> {
        self.run(|reader| reader.stats())
    }

    /// Description of the opened source. Available without a round trip.
    pub fn info(&self) -> Arc<MediaInfo> {
        Arc::clone(&self.info)
    }

    pub fn is_closed(&self) -> bool {
        self.worker.lock().is_none()
    }

    /// Finish the queued requests, drop the reader and join the worker.
    /// Requests made afterwards fail with [`SeekCacheError::WorkerGone`].
    pub fn close(&self) -> Result<()> {
        if thread::current().id() == self.worker_id {
            return Err(SeekCacheError::Reentrant);
        }
        let Some(worker) = self.worker.lock().take() else {
            return Ok(());
        };
        let _ = self.commands.send(Command::Shutdown);
        if worker.join().is_err() {
            warn!("decode worker panicked");
            return Err(SeekCacheError::WorkerGone);
        }
        debug!("decode worker joined");
        Ok(())
    }
}

impl<D: Decoder + 'static> Drop for ReaderHandle<D> {
    fn drop(&mut self) {
        if let Err(err) = self.close() {
            debug!(%err, "decode worker not joined on drop");
        }
    }
}
