use crate::errors::SyncError;
use crate::rpc::LedgerRpc;
use crate::state::Collection;
use crate::sync::accounts::fetch_account;
use crate::sync::{FetchOutcome, SyncController};

impl<'s, R: LedgerRpc> SyncController<'s, R> {
    /// Fetches the collection singleton with its mint to id mapping
    pub async fn refresh_collection(&self) -> FetchOutcome {
        let Ok(program) = self.ready_program() else {
            return FetchOutcome::NotReady;
        };
        let store = &self.session().collection;
        let Some(ticket) = store.begin_fetch(program.collection) else {
            return FetchOutcome::InFlight;
        };

        let result =
            fetch_account::<Collection, R>(self.rpc(), &program.collection, &program.program_id)
                .await
                .and_then(|collection| {
                    collection.map(Some).ok_or(SyncError::NotFound {
                        address: program.collection,
                    })
                });
        self.settle(store, ticket, result)
    }
}
