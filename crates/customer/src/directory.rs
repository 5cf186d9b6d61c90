//! Customer registry keyed by IDN.
//!
//! Callers are expected to validate the IDN already; the directory checks it
//! again because requests arrive across a process boundary.

use std::sync::Arc;

use parcel_core::domain::customer::Customer;
use parcel_core::domain::idn::Idn;
use parcel_core::{ApplicationError, RequestContext};
use parcel_db::{CustomerRepository, RepositoryError};

#[derive(Clone)]
pub struct CustomerDirectory {
    repository: Arc<dyn CustomerRepository>,
}

impl CustomerDirectory {
    pub fn new(repository: Arc<dyn CustomerRepository>) -> Self {
        Self { repository }
    }

    /// Returns the stored customer for `idn`, creating it on first use.
    /// Concurrent first calls rely on the repository's conditional write.
    pub async fn upsert_by_idn(
        &self,
        context: &RequestContext,
        idn: &str,
    ) -> Result<Customer, ApplicationError> {
        let idn = Idn::parse(idn)?;

        context
            .run(self.repository.upsert_by_idn(&idn))
            .await
            .map_err(|_| ApplicationError::DeadlineExceeded { operation: "customer upsert" })?
            .map_err(persistence)
    }

    pub async fn get_by_idn(
        &self,
        context: &RequestContext,
        idn: &str,
    ) -> Result<Customer, ApplicationError> {
        let idn = Idn::parse(idn)?;

        context
            .run(self.repository.find_by_idn(&idn))
            .await
            .map_err(|_| ApplicationError::DeadlineExceeded { operation: "customer lookup" })?
            .map_err(persistence)?
            .ok_or(ApplicationError::NotFound { entity: "customer" })
    }
}

fn persistence(error: RepositoryError) -> ApplicationError {
    ApplicationError::Persistence(error.to_string())
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use parcel_core::domain::customer::Customer;
    use parcel_core::domain::idn::Idn;
    use parcel_core::{ApplicationError, DomainError, RequestContext};
    use parcel_db::{CustomerRepository, InMemoryCustomerRepository, RepositoryError};

    use super::CustomerDirectory;

    /// Counts calls and fails every one of them.
    #[derive(Default)]
    struct BrokenRepository {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl CustomerRepository for BrokenRepository {
        async fn upsert_by_idn(&self, _idn: &Idn) -> Result<Customer, RepositoryError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(RepositoryError::Decode("disk image is malformed".to_string()))
        }

        async fn find_by_idn(&self, _idn: &Idn) -> Result<Option<Customer>, RepositoryError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(RepositoryError::Decode("disk image is malformed".to_string()))
        }
    }

    fn directory() -> CustomerDirectory {
        CustomerDirectory::new(Arc::new(InMemoryCustomerRepository::default()))
    }

    #[tokio::test]
    async fn upsert_is_idempotent_per_idn() {
        let directory = directory();
        let context = RequestContext::new("req-1");

        let first = directory.upsert_by_idn(&context, "990101123456").await.expect("first upsert");
        let second =
            directory.upsert_by_idn(&context, "990101123456").await.expect("second upsert");

        assert_eq!(first.id, second.id);
        assert_eq!(first.idn, second.idn);
        assert_eq!(first.created_at, second.created_at);
    }

    #[tokio::test]
    async fn distinct_idns_get_distinct_customers() {
        let directory = directory();
        let context = RequestContext::new("req-2");

        let first = directory.upsert_by_idn(&context, "990101123456").await.expect("first");
        let second = directory.upsert_by_idn(&context, "880202654321").await.expect("second");

        assert_ne!(first.id, second.id);
    }

    #[tokio::test]
    async fn malformed_idn_is_rejected_before_storage() {
        let repository = Arc::new(BrokenRepository::default());
        let directory = CustomerDirectory::new(repository.clone());
        let context = RequestContext::new("req-3");

        for idn in ["", "123", "99010112345a", "9901011234567", " 990101123456"] {
            let upsert = directory.upsert_by_idn(&context, idn).await;
            assert_eq!(upsert.err(), Some(ApplicationError::Domain(DomainError::InvalidIdn)));

            let lookup = directory.get_by_idn(&context, idn).await;
            assert_eq!(lookup.err(), Some(ApplicationError::Domain(DomainError::InvalidIdn)));
        }

        assert_eq!(repository.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn lookup_of_unknown_idn_is_not_found() {
        let result = directory().get_by_idn(&RequestContext::new("req-4"), "990101123456").await;

        assert_eq!(result.err(), Some(ApplicationError::NotFound { entity: "customer" }));
    }

    #[tokio::test]
    async fn lookup_returns_the_upserted_customer() {
        let directory = directory();
        let context = RequestContext::new("req-5");

        let created = directory.upsert_by_idn(&context, "990101123456").await.expect("upsert");
        let found = directory.get_by_idn(&context, "990101123456").await.expect("lookup");

        assert_eq!(created, found);
    }

    #[tokio::test]
    async fn storage_failures_become_persistence_errors() {
        let directory = CustomerDirectory::new(Arc::new(BrokenRepository::default()));
        let context = RequestContext::new("req-6");

        let error = directory
            .upsert_by_idn(&context, "990101123456")
            .await
            .expect_err("broken storage must fail");

        assert!(matches!(
            error,
            ApplicationError::Persistence(ref detail) if detail.contains("malformed")
        ));
    }

    #[tokio::test]
    async fn expired_deadline_skips_storage() {
        let repository = Arc::new(BrokenRepository::default());
        let directory = CustomerDirectory::new(repository.clone());
        let context = RequestContext::new("req-7").with_timeout(Duration::ZERO);

        let error = directory
            .upsert_by_idn(&context, "990101123456")
            .await
            .expect_err("expired context must fail");

        assert_eq!(error, ApplicationError::DeadlineExceeded { operation: "customer upsert" });
        assert_eq!(repository.calls.load(Ordering::SeqCst), 0);
    }
}
