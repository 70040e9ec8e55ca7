use std::sync::mpsc::{self, Receiver, Sender};

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("event queue was dropped")]
pub struct QueueClosed;

/// Single-consumer queue that serializes events produced on other threads
/// onto the control thread. Events come out in the order they were sent.
#[derive(Debug)]
pub struct EventQueue<T> {
    sender: Sender<T>,
    receiver: Receiver<T>,
}

#[derive(Debug)]
pub struct EventSender<T> {
    inner: Sender<T>,
}

impl<T> Clone for EventSender<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> EventSender<T> {
    pub fn send(&self, event: T) -> Result<(), QueueClosed> {
        self.inner.send(event).map_err(|_| QueueClosed)
    }
}

impl<T> Default for EventQueue<T> {
    fn default() -> Self {
        let (sender, receiver) = mpsc::channel();
        Self { sender, receiver }
    }
}

impl<T> EventQueue<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sender(&self) -> EventSender<T> {
        EventSender {
            inner: self.sender.clone(),
        }
    }

    pub fn drain_into(&self, out: &mut Vec<T>) -> usize {
        let before = out.len();
        out.extend(self.receiver.try_iter());
        out.len() - before
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;

    #[test]
    fn drain_preserves_send_order() {
        let queue = EventQueue::new();
        let sender = queue.sender();
        for value in 0..5 {
            sender.send(value).expect("send");
        }

        let mut out = Vec::new();
        assert_eq!(queue.drain_into(&mut out), 5);
        assert_eq!(out, vec![0, 1, 2, 3, 4]);
        assert_eq!(queue.drain_into(&mut out), 0);
    }

    #[test]
    fn producers_on_other_threads_keep_their_own_order() {
        let queue = EventQueue::new();
        thread::scope(|scope| {
            for producer in 0..3u32 {
                let sender = queue.sender();
                scope.spawn(move || {
                    for sequence in 0..100u32 {
                        sender.send((producer, sequence)).expect("send");
                    }
                });
            }
        });

        let mut out = Vec::new();
        queue.drain_into(&mut out);
        assert_eq!(out.len(), 300);
        for producer in 0..3u32 {
            let sequence: Vec<u32> = out
                .iter()
                .filter(|(from, _)| *from == producer)
                .map(|(_, seq)| *seq)
                .collect();
            assert_eq!(sequence, (0..100).collect::<Vec<_>>());
        }
    }

    #[test]
    fn send_after_queue_drop_fails() {
        let queue = EventQueue::<u8>::new();
        let sender = queue.sender();
        drop(queue);
        assert_eq!(sender.send(1), Err(QueueClosed));
    }
}
