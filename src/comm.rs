//! Collective reductions across mesh partitions.
//!
//! Only two collectives are needed by the core: the global minimum of the
//! time-step estimate and the global sum of pinned dofs (plus energy sums
//! for diagnostics). Every participant must call the collectives in the same
//! order; a participant that skips one leaves the others blocked.

use parking_lot::Mutex;
use std::sync::{Arc, Barrier};

/// Collective reduction primitive.
pub trait Communicator: Send + Sync {
    /// Index of this partition.
    fn rank(&self) -> usize;

    /// Number of partitions.
    fn size(&self) -> usize;

    /// Global minimum over all partitions.
    fn min_all(&self, value: f64) -> f64;

    /// Global sum over all partitions.
    fn sum_all(&self, value: f64) -> f64;

    /// Global sum of counts over all partitions.
    fn sum_all_usize(&self, value: usize) -> usize;
}

/// Single-partition communicator: every reduction is the identity.
#[derive(Clone, Copy, Debug, Default)]
pub struct SerialCommunicator;

impl Communicator for SerialCommunicator {
    fn rank(&self) -> usize {
        0
    }

    fn size(&self) -> usize {
        1
    }

    fn min_all(&self, value: f64) -> f64 {
        value
    }

    fn sum_all(&self, value: f64) -> f64 {
        value
    }

    fn sum_all_usize(&self, value: usize) -> usize {
        value
    }
}

struct Shared {
    barrier: Barrier,
    reals: Mutex<Vec<f64>>,
    counts: Mutex<Vec<usize>>,
}

/// In-process communicator group, one handle per partition thread.
///
/// Each collective writes the caller's contribution into its slot, waits for
/// all participants, reduces, and waits again so no slot is overwritten
/// before every participant has read the full set.
#[derive(Clone)]
pub struct ThreadCommunicator {
    rank: usize,
    size: usize,
    shared: Arc<Shared>,
}

impl ThreadCommunicator {
    /// Create `size` connected handles; hand handle `r` to partition `r`.
    pub fn group(size: usize) -> Vec<ThreadCommunicator> {
        assert!(size > 0, "communicator group needs at least one member");
        let shared = Arc::new(Shared {
            barrier: Barrier::new(size),
            reals: Mutex::new(vec![0.0; size]),
            counts: Mutex::new(vec![0; size]),
        });
        (0..size)
            .map(|rank| ThreadCommunicator {
                rank,
                size,
                shared: Arc::clone(&shared),
            })
            .collect()
    }

    fn reduce_real(&self, value: f64, op: impl Fn(&[f64]) -> f64) -> f64 {
        self.shared.reals.lock()[self.rank] = value;
        self.shared.barrier.wait();
        let result = op(&self.shared.reals.lock());
        self.shared.barrier.wait();
        result
    }
}

impl Communicator for ThreadCommunicator {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.size
    }

    fn min_all(&self, value: f64) -> f64 {
        self.reduce_real(value, |slots| {
            slots.iter().copied().fold(f64::INFINITY, f64::min)
        })
    }

    fn sum_all(&self, value: f64) -> f64 {
        // Fixed slot order keeps the sum identical on every rank.
        self.reduce_real(value, |slots| slots.iter().sum())
    }

    fn sum_all_usize(&self, value: usize) -> usize {
        self.shared.counts.lock()[self.rank] = value;
        self.shared.barrier.wait();
        let result = self.shared.counts.lock().iter().sum();
        self.shared.barrier.wait();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_serial_identity() {
        let comm = SerialCommunicator;
        assert_eq!(comm.size(), 1);
        assert_eq!(comm.min_all(3.5), 3.5);
        assert_eq!(comm.sum_all_usize(4), 4);
    }

    #[test]
    fn test_thread_group_reductions() {
        let handles: Vec<_> = ThreadCommunicator::group(4)
            .into_iter()
            .map(|comm| {
                thread::spawn(move || {
                    let r = comm.rank() as f64;
                    let min = comm.min_all(10.0 - r);
                    let sum = comm.sum_all(r);
                    let count = comm.sum_all_usize(comm.rank() + 1);
                    (min, sum, count)
                })
            })
            .collect();

        for h in handles {
            let (min, sum, count) = h.join().unwrap();
            assert_eq!(min, 7.0);
            assert_eq!(sum, 6.0);
            assert_eq!(count, 10);
        }
    }

    #[test]
    fn test_repeated_collectives_do_not_mix() {
        let handles: Vec<_> = ThreadCommunicator::group(3)
            .into_iter()
            .map(|comm| {
                thread::spawn(move || {
                    (0..50)
                        .map(|i| comm.sum_all((i * (comm.rank() + 1)) as f64))
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        for h in handles {
            let sums = h.join().unwrap();
            for (i, s) in sums.iter().enumerate() {
                assert_eq!(*s, (6 * i) as f64);
            }
        }
    }
}
