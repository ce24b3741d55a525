// /////////////////////////////////////////////////////////////////////////////
// Kernel Memory Core
// SPDX-License-Identifier: MIT
// /////////////////////////////////////////////////////////////////////////////

//! In-process [`Queue`]/[`QueueFactory`]: a `VecDeque` guarded by a
//! `Mutex`, with a background task draining it into the registered
//! handler. A nacked message is redelivered after `visibility_timeout`
//! unless it has exceeded `max_retries`, in which case it's moved to the
//! sibling poison queue instead (spec.md §4.4). This is a reference
//! implementation for a single process, not a distributed broker:
//! redelivery ordering across nacks is best-effort only.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};
use tokio::task::JoinHandle;

use kernel_memory_domain::error::KmError;
use kernel_memory_domain::repositories::{DequeueHandler, Queue, QueueFactory, QueueMessage, QueueOptions};

struct QueueState {
    messages: VecDeque<QueueMessage>,
}

pub struct InMemoryQueue {
    name: String,
    options: QueueOptions,
    state: Arc<Mutex<QueueState>>,
    notify: Arc<Notify>,
    worker: Mutex<Option<JoinHandle<()>>>,
    /// The sibling `<name><poison_suffix>` queue messages are routed to once
    /// `max_retries` is exceeded. `None` for a poison queue itself, which
    /// doesn't escalate further.
    poison: Option<Arc<InMemoryQueue>>,
}

impl InMemoryQueue {
    fn new(name: String, options: QueueOptions, poison: Option<Arc<InMemoryQueue>>) -> Arc<Self> {
        Arc::new(Self {
            name,
            options,
            state: Arc::new(Mutex::new(QueueState { messages: VecDeque::new() })),
            notify: Arc::new(Notify::new()),
            worker: Mutex::new(None),
            poison,
        })
    }

    fn poison_name(&self) -> String {
        format!("{}{}", self.name, self.options.poison_suffix)
    }
}

#[async_trait]
impl Queue for InMemoryQueue {
    async fn enqueue(&self, message: QueueMessage) -> Result<(), KmError> {
        self.state.lock().await.messages.push_back(message);
        self.notify.notify_one();
        Ok(())
    }

    async fn on_dequeue(&self, handler: DequeueHandler) -> Result<(), KmError> {
        let mut worker = self.worker.lock().await;
        if let Some(existing) = worker.take() {
            existing.abort();
        }

        let state = Arc::clone(&self.state);
        let notify = Arc::clone(&self.notify);
        let visibility_timeout = self.options.visibility_timeout;
        let max_retries = self.options.max_retries;
        let poison_name = self.poison_name();
        let poison = self.poison.clone();

        *worker = Some(tokio::spawn(async move {
            loop {
                let next = { state.lock().await.messages.pop_front() };
                let Some(message) = next else {
                    notify.notified().await;
                    continue;
                };

                match handler(message.clone()).await {
                    Ok(true) => {}
                    Ok(false) | Err(_) => {
                        if message.attempt >= max_retries {
                            tracing::warn!(queue = %poison_name, document_id = %message.document_id.as_str(), step = %message.step.as_str(), "message exceeded max_retries, routing to poison queue");
                            if let Some(poison) = &poison {
                                let _ = poison.enqueue(message.clone()).await;
                            }
                        } else {
                            let redelivered = message.next_attempt();
                            let state = Arc::clone(&state);
                            let notify = Arc::clone(&notify);
                            tokio::spawn(async move {
                                tokio::time::sleep(visibility_timeout).await;
                                state.lock().await.messages.push_back(redelivered);
                                notify.notify_one();
                            });
                        }
                    }
                }
            }
        }));
        Ok(())
    }

    async fn dispose(&self) -> Result<(), KmError> {
        if let Some(worker) = self.worker.lock().await.take() {
            worker.abort();
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryQueueFactory {
    queues: Mutex<HashMap<String, Arc<InMemoryQueue>>>,
}

impl InMemoryQueueFactory {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl QueueFactory for InMemoryQueueFactory {
    async fn connect_to(&self, name: &str, options: QueueOptions) -> Result<Arc<dyn Queue>, KmError> {
        let mut queues = self.queues.lock().await;
        if let Some(existing) = queues.get(name) {
            return Ok(Arc::clone(existing) as Arc<dyn Queue>);
        }

        let poison_name = format!("{name}{}", options.poison_suffix);
        let poison = queues.entry(poison_name.clone()).or_insert_with(|| InMemoryQueue::new(poison_name, options.clone(), None)).clone();
        let queue = queues.entry(name.to_string()).or_insert_with(|| InMemoryQueue::new(name.to_string(), options, Some(poison))).clone();
        Ok(queue as Arc<dyn Queue>)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kernel_memory_domain::value_objects::{DocumentId, IndexName, StepName};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn dequeued_message_reaches_handler() {
        let factory = InMemoryQueueFactory::new();
        let queue = factory.connect_to("km-extract", QueueOptions::default()).await.unwrap();

        let received = Arc::new(AtomicUsize::new(0));
        let received_clone = Arc::clone(&received);
        queue
            .on_dequeue(Arc::new(move |_msg| {
                let received = Arc::clone(&received_clone);
                Box::pin(async move {
                    received.fetch_add(1, Ordering::SeqCst);
                    Ok(true)
                })
            }))
            .await
            .unwrap();

        queue
            .enqueue(QueueMessage::first_attempt(IndexName::new("default"), DocumentId::new("d1"), StepName::extract()))
            .await
            .unwrap();

        tokio::time::timeout(Duration::from_secs(1), async {
            while received.load(Ordering::SeqCst) == 0 {
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn exhausted_message_lands_in_the_poison_queue() {
        let factory = InMemoryQueueFactory::new();
        let options = QueueOptions { max_retries: 1, ..QueueOptions::default() };
        let queue = factory.connect_to("km-extract", options.clone()).await.unwrap();
        let poison = factory.connect_to("km-extract-poison", options).await.unwrap();

        queue
            .on_dequeue(Arc::new(move |_msg| Box::pin(async move { Ok(false) })))
            .await
            .unwrap();

        let poisoned = Arc::new(AtomicUsize::new(0));
        let poisoned_clone = Arc::clone(&poisoned);
        poison
            .on_dequeue(Arc::new(move |_msg| {
                let poisoned = Arc::clone(&poisoned_clone);
                Box::pin(async move {
                    poisoned.fetch_add(1, Ordering::SeqCst);
                    Ok(true)
                })
            }))
            .await
            .unwrap();

        queue
            .enqueue(QueueMessage::first_attempt(IndexName::new("default"), DocumentId::new("d1"), StepName::extract()))
            .await
            .unwrap();

        tokio::time::timeout(Duration::from_secs(1), async {
            while poisoned.load(Ordering::SeqCst) == 0 {
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();
    }
}
