use crate::models::{ActorId, CapabilitySet};

/// Interface to the actor/identity collaborator.
///
/// The engine only consults it to authorize admin draws; everything else
/// about identity lives outside this core.
pub trait IdentityRepository: super::Repository {
    /// The capability set granted to an actor, or `None` for an unknown
    /// actor.
    fn capabilities(
        &self,
        actor: ActorId,
    ) -> impl Future<Output = Result<Option<CapabilitySet>, Self::Error>> + Send;
}
