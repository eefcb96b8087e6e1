//! Order-preserving parallel map.
//!
//! Every multi-stage job in the crate (forward indexing, inversion, link
//! resolution) runs through [`PipelineConfig::ordered_map`]: a producer thread
//! tags items with their dispatch sequence number and feeds a bounded queue, a
//! fixed pool of workers transforms them, and the calling thread reassembles
//! results by sequence number before handing them to a sequential sink. The
//! sink therefore observes results in exactly the order the items were
//! produced, regardless of which worker finished first.
//!
//! ```
//! use bibdex::pipeline::PipelineConfig;
//!
//! let mut seen = Vec::new();
//! PipelineConfig::new(4, 2)
//!     .ordered_map(0..100u32, |n| n * 2, |n| {
//!         seen.push(n);
//!         Ok(())
//!     })
//!     .unwrap();
//! assert_eq!(seen, (0..100u32).map(|n| n * 2).collect::<Vec<_>>());
//! ```

use std::collections::BTreeMap;
use std::thread;

use crossbeam_channel::bounded;

use crate::error::{BibdexError, Result};

/// Sizing for one pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Number of worker threads.
    pub workers: usize,
    /// Capacity of each bounded queue.
    pub capacity: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig::new(num_cpus::get(), 256)
    }
}

/// Buffers out-of-order results until the next expected sequence number arrives.
#[derive(Debug)]
struct Reassembly<R> {
    next: u64,
    pending: BTreeMap<u64, R>,
}

impl<R> Reassembly<R> {
    fn new() -> Self {
        Reassembly {
            next: 0,
            pending: BTreeMap::new(),
        }
    }

    fn insert(&mut self, seq: u64, value: R) {
        self.pending.insert(seq, value);
    }

    fn pop_ready(&mut self) -> Option<R> {
        let value = self.pending.remove(&self.next)?;
        self.next += 1;
        Some(value)
    }

    fn is_drained(&self) -> bool {
        self.pending.is_empty()
    }
}

impl PipelineConfig {
    pub fn new(workers: usize, capacity: usize) -> Self {
        PipelineConfig {
            workers: workers.max(1),
            capacity: capacity.max(1),
        }
    }

    /// Map `work` over `items` on the worker pool and feed the results to
    /// `sink` in item order.
    ///
    /// The first error returned by `sink` stops the pipeline: queues are
    /// dropped, workers and the producer wind down, and the error is returned.
    /// A panicking worker or producer surfaces as [`BibdexError::Pipeline`].
    pub fn ordered_map<I, T, R, F, S>(&self, items: I, work: F, mut sink: S) -> Result<()>
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: Send,
        T: Send,
        R: Send,
        F: Fn(T) -> R + Sync,
        S: FnMut(R) -> Result<()>,
    {
        let items = items.into_iter();
        let (work_tx, work_rx) = bounded::<(u64, T)>(self.capacity);
        let (done_tx, done_rx) = bounded::<(u64, R)>(self.capacity);
        let work = &work;

        thread::scope(|scope| {
            let producer = scope.spawn(move || {
                for (seq, item) in items.enumerate() {
                    if work_tx.send((seq as u64, item)).is_err() {
                        break;
                    }
                }
            });

            let workers: Vec<_> = (0..self.workers)
                .map(|_| {
                    let rx = work_rx.clone();
                    let tx = done_tx.clone();
                    scope.spawn(move || {
                        for (seq, item) in rx {
                            if tx.send((seq, work(item))).is_err() {
                                break;
                            }
                        }
                    })
                })
                .collect();
            drop(work_rx);
            drop(done_tx);

            let mut outcome = Ok(());
            let mut reassembly = Reassembly::new();
            {
                let done_rx = done_rx;
                'receive: for (seq, value) in &done_rx {
                    reassembly.insert(seq, value);
                    while let Some(value) = reassembly.pop_ready() {
                        if let Err(e) = sink(value) {
                            outcome = Err(e);
                            break 'receive;
                        }
                    }
                }
            }

            let mut panicked = producer.join().is_err();
            for worker in workers {
                panicked |= worker.join().is_err();
            }

            outcome?;
            if panicked {
                return Err(BibdexError::pipeline("a pipeline thread panicked"));
            }
            if !reassembly.is_drained() {
                return Err(BibdexError::pipeline(
                    "pipeline finished with results missing from the sequence",
                ));
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_results_arrive_in_dispatch_order() {
        let mut seen = Vec::new();
        PipelineConfig::new(8, 4)
            .ordered_map(
                0..200u64,
                |n| {
                    // Early items finish last.
                    thread::sleep(Duration::from_micros((200 - n) * 10));
                    n
                },
                |n| {
                    seen.push(n);
                    Ok(())
                },
            )
            .unwrap();
        assert_eq!(seen, (0..200).collect::<Vec<_>>());
    }

    #[test]
    fn test_sink_error_stops_pipeline() {
        let mut count = 0;
        let result = PipelineConfig::new(2, 1).ordered_map(
            0..10_000u32,
            |n| n,
            |n| {
                count += 1;
                if n == 5 {
                    Err(BibdexError::pipeline("stop"))
                } else {
                    Ok(())
                }
            },
        );
        assert!(matches!(result, Err(BibdexError::Pipeline(_))));
        assert_eq!(count, 6);
    }

    #[test]
    fn test_worker_panic_is_reported() {
        let result = PipelineConfig::new(2, 2).ordered_map(
            0..10u32,
            |n| {
                if n == 3 {
                    panic!("boom");
                }
                n
            },
            |_| Ok(()),
        );
        assert!(matches!(result, Err(BibdexError::Pipeline(_))));
    }

    #[test]
    fn test_empty_input() {
        let mut called = false;
        PipelineConfig::new(3, 3)
            .ordered_map(Vec::<u32>::new(), |n| n, |_| {
                called = true;
                Ok(())
            })
            .unwrap();
        assert!(!called);
    }

    #[test]
    fn test_reassembly_buffers_gaps() {
        let mut reassembly = Reassembly::new();
        reassembly.insert(1, "b");
        assert_eq!(reassembly.pop_ready(), None);
        reassembly.insert(0, "a");
        assert_eq!(reassembly.pop_ready(), Some("a"));
        assert_eq!(reassembly.pop_ready(), Some("b"));
        assert!(reassembly.is_drained());
    }
}
