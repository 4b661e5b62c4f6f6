use crate::{Db, StoreError};
use ledger_core::{
    models::{ActorId, Capability, CapabilitySet},
    ports::IdentityRepository,
};

impl IdentityRepository for Db {
    async fn capabilities(&self, actor: ActorId) -> Result<Option<CapabilitySet>, StoreError> {
        let row = sqlx::query_scalar::<_, i64>("select is_admin from actor where id = ?")
            .bind(actor.to_string())
            .fetch_optional(&self.reader)
            .await?;
        Ok(row.map(|is_admin| {
            let set = CapabilitySet::default();
            if is_admin != 0 {
                set.grant(Capability::Admin)
            } else {
                set
            }
        }))
    }
}
