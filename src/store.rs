use std::collections::HashMap;

use tokio::sync::RwLock;

use crate::{
    billing::Payment,
    error::StoreError,
    student::{ParentId, StudentId, StudentSubscription, SubscriptionUpdate},
};

/// The document store holding student and parent records.
///
/// Implementations own conflict resolution between devices; callers always
/// fetch a fresh snapshot before computing an update.
#[allow(async_fn_in_trait)]
pub trait StudentStore {
    async fn fetch_student(&self, id: &str) -> Result<StudentSubscription, StoreError>;

    async fn update_student(&self, id: &str, update: &SubscriptionUpdate)
        -> Result<(), StoreError>;

    async fn append_payment(&self, parent_id: &str, payment: Payment) -> Result<(), StoreError>;

    async fn payments(&self, parent_id: &str) -> Result<Vec<Payment>, StoreError>;
}

/// In-process store, last write wins.
#[derive(Debug, Default)]
pub struct MemoryStore {
    students: RwLock<HashMap<StudentId, StudentSubscription>>,
    payments: RwLock<HashMap<ParentId, Vec<Payment>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_student<S>(&self, id: S, student: StudentSubscription)
    where
        S: Into<StudentId>,
    {
        self.students.write().await.insert(id.into(), student);
    }

    pub async fn insert_parent<S>(&self, id: S)
    where
        S: Into<ParentId>,
    {
        self.payments.write().await.entry(id.into()).or_default();
    }
}

impl StudentStore for MemoryStore {
    async fn fetch_student(&self, id: &str) -> Result<StudentSubscription, StoreError> {
        self.students
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::StudentNotFound(id.to_string()))
    }

    async fn update_student(
        &self,
        id: &str,
        update: &SubscriptionUpdate,
    ) -> Result<(), StoreError> {
        let mut students = self.students.write().await;
        let student = students
            .get_mut(id)
            .ok_or_else(|| StoreError::StudentNotFound(id.to_string()))?;
        student.apply(update);

        Ok(())
    }

    async fn append_payment(&self, parent_id: &str, payment: Payment) -> Result<(), StoreError> {
        self.payments
            .write()
            .await
            .get_mut(parent_id)
            .ok_or_else(|| StoreError::ParentNotFound(parent_id.to_string()))?
            .push(payment);

        Ok(())
    }

    async fn payments(&self, parent_id: &str) -> Result<Vec<Payment>, StoreError> {
        self.payments
            .read()
            .await
            .get(parent_id)
            .cloned()
            .ok_or_else(|| StoreError::ParentNotFound(parent_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::student::SubscriptionStatus;

    #[tokio::test]
    async fn test_update_merges_fields() -> Result<(), StoreError> {
        let store = MemoryStore::new();
        store
            .insert_student("s1", StudentSubscription::enrolled())
            .await;

        let update = SubscriptionUpdate {
            subscription_status: Some(SubscriptionStatus::Expired),
            ..Default::default()
        };
        store.update_student("s1", &update).await?;

        let student = store.fetch_student("s1").await?;
        assert_eq!(SubscriptionStatus::Expired, student.subscription_status);

        Ok(())
    }

    #[tokio::test]
    async fn test_missing_records() {
        let store = MemoryStore::new();

        assert_eq!(
            Err(StoreError::StudentNotFound("nobody".into())),
            store.fetch_student("nobody").await
        );
        assert_eq!(
            Err(StoreError::ParentNotFound("p1".into())),
            store.payments("p1").await
        );
    }
}
