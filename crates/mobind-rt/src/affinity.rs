//! Thread affinity of calls into target implementations.

use std::thread::{self, JoinHandle, ThreadId};

use crossbeam::channel::{self, Sender};

use crate::error::{RuntimeError, RuntimeResult};

type Job = Box<dyn FnOnce() + Send>;

/// Where a dispatched call runs.
pub enum Affinity {
    /// On the calling thread.
    Caller,
    /// On a designated owner thread; calls from other threads are
    /// redispatched and block until they complete.
    Owner(OwnerThread),
}

impl Affinity {
    pub fn run<R, F>(&self, f: F) -> RuntimeResult<R>
    where
        R: Send + 'static,
        F: FnOnce() -> R + Send + 'static,
    {
        match self {
            Affinity::Caller => Ok(f()),
            Affinity::Owner(owner) => owner.run(f),
        }
    }
}

pub struct OwnerThread {
    sender: Option<Sender<Job>>,
    id: ThreadId,
    join: Option<JoinHandle<()>>,
}

impl OwnerThread {
    pub fn spawn(name: &str) -> RuntimeResult<Self> {
        let (sender, receiver) = channel::unbounded::<Job>();
        let join = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                for job in receiver {
                    job();
                }
            })
            .map_err(|e| RuntimeError::ThreadDispatch(e.to_string()))?;
        Ok(OwnerThread {
            sender: Some(sender),
            id: join.thread().id(),
            join: Some(join),
        })
    }

    pub fn is_current(&self) -> bool {
        thread::current().id() == self.id
    }

    pub fn run<R, F>(&self, f: F) -> RuntimeResult<R>
    where
        R: Send + 'static,
        F: FnOnce() -> R + Send + 'static,
    {
        if self.is_current() {
            return Ok(f());
        }
        let sender = self
            .sender
            .as_ref()
            .ok_or_else(|| RuntimeError::ThreadDispatch("owner thread stopped".to_string()))?;
        let (reply, result) = channel::bounded(1);
        sender
            .send(Box::new(move || {
                // The caller may have given up waiting.
                let _ = reply.send(f());
            }))
            .map_err(|_| RuntimeError::ThreadDispatch("owner thread stopped".to_string()))?;
        result
            .recv()
            .map_err(|_| RuntimeError::ThreadDispatch("call panicked on the owner thread".to_string()))
    }
}

impl Drop for OwnerThread {
    fn drop(&mut self) {
        self.sender.take();
        if let Some(join) = self.join.take() {
            if join.join().is_err() {
                log::error!("Owner thread panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owner_calls_run_on_the_owner_thread() {
        let owner = OwnerThread::spawn("mobind-main").unwrap();
        let name = owner
            .run(|| thread::current().name().map(str::to_string))
            .unwrap();
        assert_eq!(name.as_deref(), Some("mobind-main"));
        assert!(!owner.is_current());

        let caller = Affinity::Caller;
        let here = thread::current().id();
        assert_eq!(caller.run(move || thread::current().id() == here).unwrap(), true);
    }
}
