use crate::errors::SyncError;
use crate::rpc::LedgerRpc;
use crate::session::TokenBalance;
use crate::sync::{FetchOutcome, SyncController};

impl<'s, R: LedgerRpc> SyncController<'s, R> {
    /// Fetches the raw balance of the selected token account
    pub async fn refresh_token_balance(&self) -> FetchOutcome {
        if self.ready_program().is_err() {
            return FetchOutcome::NotReady;
        }
        let store = &self.session().token;
        let Some(account) = store.desired() else {
            return FetchOutcome::NotReady;
        };
        let Some(ticket) = store.begin_fetch(account) else {
            return FetchOutcome::InFlight;
        };

        let result = match self.rpc().get_token_account_balance(&account).await {
            Ok(Some(amount)) => Ok(Some(TokenBalance { account, amount })),
            Ok(None) => Err(SyncError::NotFound { address: account }),
            Err(err) => Err(err.into()),
        };
        self.settle(store, ticket, result)
    }
}
