use async_trait::async_trait;
use campus_core::errors::CampusResult;
use campus_core::migration::MigrationLedger;
use campus_core::reference::{Assignment, ReferenceId, ReferenceStore};
use mockall::mock;
use uuid::Uuid;

// Mock stores for testing the core services without Postgres
mock! {
    pub ReferenceStore {}

    #[async_trait]
    impl ReferenceStore for ReferenceStore {
        async fn reference_exists(&self, reference: &ReferenceId) -> CampusResult<bool>;

        async fn assign_reference(
            &self,
            appointment_id: Uuid,
            reference: &ReferenceId,
        ) -> CampusResult<Assignment>;
    }
}

mock! {
    pub MigrationLedger {}

    #[async_trait]
    impl MigrationLedger for MigrationLedger {
        type Transaction = ();

        async fn applied_migrations(&self) -> CampusResult<Vec<String>>;

        async fn begin(&self) -> CampusResult<()>;

        async fn record_applied(&self, tx: &mut (), name: &str) -> CampusResult<()>;

        async fn record_reverted(&self, tx: &mut (), name: &str) -> CampusResult<()>;

        async fn commit(&self, tx: ()) -> CampusResult<()>;
    }
}
