//! # Concurrency Fabric Module
//!
//! The shared primitives the update daemon (and anything else that wants a
//! pool of stoppable workers) is built on (C5): [`worker`]'s stoppable
//! worker, [`tasq`]'s MPMC queue, and [`pool`]'s work-stealing pool over a
//! set of those queues.

pub mod pool;
pub mod tasq;
pub mod worker;

pub use pool::WorkStealingPool;
pub use tasq::TasQ;
pub use worker::StoppableWorker;
