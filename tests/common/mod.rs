#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicU32, Ordering},
    },
};

use anyhow::{Error, anyhow};
use async_trait::async_trait;
use chrono::Utc;
use notification_service::{
    clients::{NotificationStore, PushGateway, RecipientResolver},
    dispatch::Dispatcher,
    models::{
        notification::{
            AdminNotification, CreateAdminNotification, CreateNotification, Notification,
        },
        recipient::Recipient,
    },
};
use tokio::time::{Duration, sleep};
use uuid::Uuid;

/// In-memory store implementing both the resolver and the durable-store
/// seams, with call counters and failure switches for fault-injection.
#[derive(Default)]
pub struct MockStore {
    pub recipients: Mutex<HashMap<String, Recipient>>,
    pub notifications: Mutex<Vec<CreateNotification>>,
    pub admin_notifications: Mutex<Vec<AdminNotification>>,
    pub lookups: AtomicU32,
    pub fail_resolver: AtomicBool,
    pub fail_token_clears: AtomicBool,
    pub fail_notification_writes: AtomicBool,
    pub fail_admin_writes: AtomicBool,
}

impl MockStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn add_recipient(&self, id: &str, token: Option<&str>, active: bool) {
        self.recipients.lock().unwrap().insert(
            id.to_string(),
            Recipient {
                id: id.to_string(),
                device_token: token.map(str::to_string),
                active,
            },
        );
    }

    pub fn token_of(&self, id: &str) -> Option<String> {
        self.recipients
            .lock()
            .unwrap()
            .get(id)
            .and_then(|r| r.device_token.clone())
    }

    pub fn notification_count(&self) -> usize {
        self.notifications.lock().unwrap().len()
    }
}

#[async_trait]
impl RecipientResolver for MockStore {
    async fn list_active_recipients_with_token(&self) -> Result<Vec<Recipient>, Error> {
        if self.fail_resolver.load(Ordering::SeqCst) {
            return Err(anyhow!("resolver unreachable"));
        }

        let mut recipients: Vec<Recipient> = self
            .recipients
            .lock()
            .unwrap()
            .values()
            .filter(|r| r.active && r.usable_token().is_some())
            .cloned()
            .collect();

        recipients.sort_by(|a, b| a.id.cmp(&b.id));

        Ok(recipients)
    }
}

#[async_trait]
impl NotificationStore for MockStore {
    async fn find_recipient_by_id(&self, id: &str) -> Result<Option<Recipient>, Error> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self.recipients.lock().unwrap().get(id).cloned())
    }

    async fn clear_device_token(&self, id: &str) -> Result<(), Error> {
        if self.fail_token_clears.load(Ordering::SeqCst) {
            return Err(anyhow!("token clear refused"));
        }

        if let Some(recipient) = self.recipients.lock().unwrap().get_mut(id) {
            recipient.device_token = None;
        }
        Ok(())
    }

    async fn create_notification(&self, record: CreateNotification) -> Result<Notification, Error> {
        if self.fail_notification_writes.load(Ordering::SeqCst) {
            return Err(anyhow!("notification write refused"));
        }

        let notification = Notification {
            id: Uuid::new_v4(),
            title: record.title.clone(),
            description: record.description.clone(),
            kind: record.kind.clone(),
            user_id: record.user_id.clone(),
            demand: record.demand.clone(),
            is_read: false,
            created_at: Utc::now(),
        };

        self.notifications.lock().unwrap().push(record);

        Ok(notification)
    }

    async fn create_admin_notification(
        &self,
        record: CreateAdminNotification,
    ) -> Result<AdminNotification, Error> {
        if self.fail_admin_writes.load(Ordering::SeqCst) {
            return Err(anyhow!("admin feed write refused"));
        }

        let notification = AdminNotification {
            id: Uuid::new_v4(),
            title: record.title,
            description: record.description,
            kind: record.kind,
            is_read: false,
            created_at: Utc::now(),
        };

        self.admin_notifications
            .lock()
            .unwrap()
            .push(notification.clone());

        Ok(notification)
    }

    async fn list_admin_notifications(
        &self,
        page: u64,
        limit: u64,
    ) -> Result<Vec<AdminNotification>, Error> {
        let all = self.admin_notifications.lock().unwrap();
        let mut newest_first: Vec<AdminNotification> = all.iter().rev().cloned().collect();

        let start = ((page.max(1) - 1) * limit) as usize;
        if start >= newest_first.len() {
            return Ok(Vec::new());
        }

        let page_items = newest_first.split_off(start);
        Ok(page_items.into_iter().take(limit as usize).collect())
    }

    async fn count_admin_notifications(&self) -> Result<u64, Error> {
        Ok(self.admin_notifications.lock().unwrap().len() as u64)
    }

    async fn health_check(&self) -> Result<(), Error> {
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub enum SendBehavior {
    Deliver,
    Reject,
    Fail(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayEvent {
    Started(String),
    Finished(String),
}

/// Scripted push gateway recording call counts, a start/finish sequence
/// log, and the peak number of concurrent in-flight sends.
pub struct MockGateway {
    behaviors: Mutex<HashMap<String, SendBehavior>>,
    pub calls: AtomicU32,
    pub events: Mutex<Vec<GatewayEvent>>,
    in_flight: AtomicU32,
    pub max_in_flight: AtomicU32,
    delay: Duration,
}

impl MockGateway {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            behaviors: Mutex::new(HashMap::new()),
            calls: AtomicU32::new(0),
            events: Mutex::new(Vec::new()),
            in_flight: AtomicU32::new(0),
            max_in_flight: AtomicU32::new(0),
            delay: Duration::ZERO,
        })
    }

    pub fn with_delay(delay_ms: u64) -> Arc<Self> {
        Arc::new(Self {
            behaviors: Mutex::new(HashMap::new()),
            calls: AtomicU32::new(0),
            events: Mutex::new(Vec::new()),
            in_flight: AtomicU32::new(0),
            max_in_flight: AtomicU32::new(0),
            delay: Duration::from_millis(delay_ms),
        })
    }

    /// Scripts the response for sends using `token`; unscripted tokens
    /// deliver successfully.
    pub fn script(&self, token: &str, behavior: SendBehavior) {
        self.behaviors
            .lock()
            .unwrap()
            .insert(token.to_string(), behavior);
    }

    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PushGateway for MockGateway {
    async fn send(
        &self,
        token: &str,
        _title: &str,
        _body: &str,
        _metadata: &HashMap<String, String>,
    ) -> Result<bool, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        self.events
            .lock()
            .unwrap()
            .push(GatewayEvent::Started(token.to_string()));

        sleep(self.delay).await;

        self.events
            .lock()
            .unwrap()
            .push(GatewayEvent::Finished(token.to_string()));
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let behavior = self
            .behaviors
            .lock()
            .unwrap()
            .get(token)
            .cloned()
            .unwrap_or(SendBehavior::Deliver);

        match behavior {
            SendBehavior::Deliver => Ok(true),
            SendBehavior::Reject => Ok(false),
            SendBehavior::Fail(message) => Err(anyhow!("{}", message)),
        }
    }
}

pub fn dispatcher(store: &Arc<MockStore>, gateway: &Arc<MockGateway>) -> Dispatcher {
    Dispatcher::new(store.clone(), store.clone(), gateway.clone())
}
