//! A bounded worker pool with backpressure, built directly on `std::thread` and
//! `std::sync::{Mutex, Condvar}` with no wrapper layer in between. Each worker is handed its own
//! index by value at spawn time, so there's no shared state to race on during startup.

use crate::error::{Error, Result};
use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex};
use std::thread::JoinHandle;

/// A job submitted to the pool: a boxed closure that runs on a worker thread.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// A single-producer/multi-consumer FIFO with a blocking `pop`. Used both for each worker's
/// private inbox and for the pool-wide "idle worker" signal.
struct BlockingQueue<T> {
    state: Mutex<VecDeque<T>>,
    available: Condvar,
}

impl<T> BlockingQueue<T> {
    fn new() -> Self {
        Self { state: Mutex::new(VecDeque::new()), available: Condvar::new() }
    }

    fn push(&self, item: T) {
        let mut state = self.state.lock().unwrap();
        state.push_back(item);
        self.available.notify_one();
    }

    /// Blocks until an item is available, then returns it.
    fn pop(&self) -> T {
        let mut state = self.state.lock().unwrap();
        loop {
            if let Some(item) = state.pop_front() {
                return item;
            }
            state = self.available.wait(state).unwrap();
        }
    }
}

/// A sentinel-or-job wrapper so a worker's private queue can signal shutdown without an
/// `Option<Job>` leaking through the public `submit` API.
enum Message {
    Job(Job),
    Shutdown,
}

struct Worker {
    inbox: Arc<BlockingQueue<Message>>,
    handle: Option<JoinHandle<()>>,
}

/// A fixed-size pool of worker threads. `submit` blocks until a worker is idle, handing it the
/// job directly -- this is the pool's only form of backpressure.
pub struct WorkerPool {
    workers: Vec<Worker>,
    idle: Arc<BlockingQueue<usize>>,
}

impl WorkerPool {
    /// Spawns `num_threads` worker threads, each immediately announcing itself idle.
    ///
    /// If a thread fails to spawn partway through, the workers already spawned are shut down
    /// cleanly (each gets its shutdown sentinel and is joined) before the error is returned, so no
    /// thread is left running detached.
    ///
    /// # Panics
    /// Panics if `num_threads` is 0.
    pub fn new(num_threads: usize) -> Result<Self> {
        assert!(num_threads >= 1, "num_threads must not be smaller than 1");

        let idle = Arc::new(BlockingQueue::new());
        let mut workers = Vec::with_capacity(num_threads);
        for index in 0..num_threads {
            let inbox = Arc::new(BlockingQueue::new());
            let worker_idle = Arc::clone(&idle);
            let worker_inbox = Arc::clone(&inbox);
            match std::thread::Builder::new()
                .name(format!("wavmp3-worker-{index}"))
                .spawn(move || run_worker(index, &worker_inbox, &worker_idle))
            {
                Ok(handle) => workers.push(Worker { inbox, handle: Some(handle) }),
                Err(source) => {
                    drop(Self { workers, idle });
                    return Err(Error::ThreadSpawn(source));
                }
            }
        }

        Ok(Self { workers, idle })
    }

    /// Submits `job` to the pool. Blocks until a worker is idle, then hands the job to it.
    pub fn submit(&self, job: Job) {
        let index = self.idle.pop();
        self.workers[index].inbox.push(Message::Job(job));
    }

    /// The number of worker threads in this pool.
    pub fn num_threads(&self) -> usize {
        self.workers.len()
    }
}

impl Drop for WorkerPool {
    /// Enqueues one shutdown sentinel per worker, then joins each one. Submitting after this
    /// point is undefined behavior for the caller.
    fn drop(&mut self) {
        for worker in &self.workers {
            worker.inbox.push(Message::Shutdown);
        }
        for worker in &mut self.workers {
            if let Some(handle) = worker.handle.take() {
                let _ = handle.join();
            }
        }
    }
}

fn run_worker(index: usize, inbox: &BlockingQueue<Message>, idle: &BlockingQueue<usize>) {
    loop {
        idle.push(index);
        match inbox.pop() {
            Message::Job(job) => job(),
            Message::Shutdown => return,
        }
    }
}
