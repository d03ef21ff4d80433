use std::cell::RefCell;

use anchor_lang::prelude::Pubkey;
use log::{debug, info, log, warn};
use solana_compute_budget_interface::ComputeBudgetInstruction;
use solana_sdk::instruction::Instruction;
use solana_sdk::message::Message;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::Transaction;

use crate::connection::WalletSigner;
use crate::constants::methods;
use crate::derivation::TransactionAddresses;
use crate::errors::SyncError;
use crate::events::SyncEvent;
use crate::interface::{DepositArgs, WithdrawArgs, VAULT_INTERFACE};
use crate::rpc::LedgerRpc;
use crate::session::PositionKey;
use crate::sync::SyncController;
use crate::transaction::state::{TransactionState, TxStatus, VaultAction};

/// Records to invalidate once a submission lands
#[derive(Debug, Clone, Copy)]
struct AffectedRecords {
    vault: Pubkey,
    position: PositionKey,
    token_account: Pubkey,
}

/// Sequences deposit and withdraw submissions: build, sign, confirm, reconcile
///
/// Every check that can fail locally runs in `Building`, before the wallet is asked to sign.
pub struct SubmissionPipeline<'c, 's, R, W> {
    controller: &'c SyncController<'s, R>,
    signer: &'c W,
    state: RefCell<TransactionState>,
}

impl<'c, 's, R: LedgerRpc, W: WalletSigner> SubmissionPipeline<'c, 's, R, W> {
    pub fn new(controller: &'c SyncController<'s, R>, signer: &'c W) -> Self {
        Self {
            controller,
            signer,
            state: RefCell::new(TransactionState::default()),
        }
    }

    pub fn state(&self) -> TransactionState {
        self.state.borrow().clone()
    }

    /// Submits `action` and returns its signature, or `None` when the attempt failed
    ///
    /// The outcome, including any error, is in `state()` afterwards.
    pub async fn submit(&self, action: VaultAction) -> Option<Signature> {
        if self.state.borrow().status.is_in_progress() {
            warn!("ignoring {action}: a submission is already in progress");
            return None;
        }
        *self.state.borrow_mut() = TransactionState::default();

        self.enter(TxStatus::Building, format!("Preparing {action}"));
        let (transaction, affected) = match self.prepare(action).await {
            Ok(prepared) => prepared,
            Err(err) => return self.fail(err),
        };

        self.enter(TxStatus::Signing, "Waiting for wallet approval".to_string());
        let signed = match self.signer.sign_transaction(transaction).await {
            Ok(signed) => signed,
            Err(err) => return self.fail(err.into()),
        };

        self.enter(TxStatus::Confirming, "Confirming transaction".to_string());
        let signature = match self.controller.rpc().send_and_confirm(&signed).await {
            Ok(signature) => signature,
            Err(err) => return self.fail(err.into()),
        };

        self.reconcile(&affected);
        self.state.borrow_mut().signature = Some(signature);
        self.enter(TxStatus::Success, format!("Confirmed {action}: {signature}"));
        info!("{action} confirmed: {signature}");
        Some(signature)
    }

    /// Precondition checks, address derivation, pre-flight validation and message assembly
    async fn prepare(&self, action: VaultAction) -> Result<(Transaction, AffectedRecords), SyncError> {
        let controller = self.controller;
        let session = controller.session();

        let program = controller.ready_program()?;
        let wallet = controller.wallet()?;
        if self.signer.pubkey() != wallet {
            return Err(SyncError::MissingPrecondition(format!(
                "signer {} is not the connected wallet {wallet}",
                self.signer.pubkey()
            )));
        }
        let selection = session.selection().required()?;
        let vault = controller.fresh_vault().ok_or_else(|| {
            SyncError::MissingPrecondition("vault record is not loaded".into())
        })?;

        let addresses = TransactionAddresses::derive(
            &program,
            &vault,
            &wallet,
            &selection.nft_mint,
            &selection.token_account,
        )?;

        let position_key = PositionKey {
            wallet,
            nft_mint: selection.nft_mint,
        };
        let position = session.position.get(&position_key);
        if let Some(source) = session.position_source(&position_key) {
            if position.has_been_fetched() && source != addresses.position {
                return Err(SyncError::MissingPrecondition(
                    "cached position was read from different addresses; refresh it first".into(),
                ));
            }
        }

        let named = addresses.named();
        let instruction = match action {
            VaultAction::Deposit { amount } => {
                if amount == 0 {
                    return Err(SyncError::Validation(
                        "deposit amount must be greater than zero".into(),
                    ));
                }
                if selection.token_mint != vault.deposit_mint {
                    return Err(SyncError::Validation(format!(
                        "selected token {} is not the vault deposit mint {}",
                        selection.token_mint, vault.deposit_mint
                    )));
                }
                let balance = session.token.get(&selection.token_account);
                let available = match (&balance.data, balance.is_fresh()) {
                    (Some(balance), true) => balance.amount,
                    _ => {
                        return Err(SyncError::MissingPrecondition(
                            "token balance is not loaded".into(),
                        ))
                    }
                };
                if amount > available {
                    return Err(SyncError::Validation(format!(
                        "deposit of {amount} exceeds token balance of {available}"
                    )));
                }
                VAULT_INTERFACE.method(methods::DEPOSIT)?.build(
                    &program.program_id,
                    &named,
                    &DepositArgs { amount },
                )?
            }
            VaultAction::Withdraw { shares } => {
                if !position.is_fresh() {
                    return Err(SyncError::MissingPrecondition(
                        "position is not loaded".into(),
                    ));
                }
                let available = position.data.as_ref().map_or(0, |p| p.info.shares);
                if shares == 0 {
                    return Err(SyncError::Validation(
                        "withdraw amount must be greater than zero".into(),
                    ));
                }
                if shares > available {
                    return Err(SyncError::Validation(format!(
                        "withdrawal of {shares} shares exceeds position balance of {available}"
                    )));
                }
                VAULT_INTERFACE.method(methods::WITHDRAW)?.build(
                    &program.program_id,
                    &named,
                    &WithdrawArgs { shares },
                )?
            }
        };

        let mut instructions: Vec<Instruction> = Vec::with_capacity(2);
        if let Some(units) = controller.config().compute_unit_limit {
            instructions.push(ComputeBudgetInstruction::set_compute_unit_limit(units));
        }
        instructions.push(instruction);

        let blockhash = controller.rpc().latest_blockhash().await?;
        let message = Message::new_with_blockhash(&instructions, Some(&wallet), &blockhash);

        Ok((
            Transaction::new_unsigned(message),
            AffectedRecords {
                vault: program.vault,
                position: position_key,
                token_account: selection.token_account,
            },
        ))
    }

    /// Marks every record the transaction touched stale so the next read re-fetches
    fn reconcile(&self, affected: &AffectedRecords) {
        let session = self.controller.session();
        session.vault.invalidate(&affected.vault);
        session.position.invalidate(&affected.position);
        session.positions.invalidate(&affected.position.wallet);
        session.token.invalidate(&affected.token_account);
        for store in [
            session.vault.name(),
            session.position.name(),
            session.positions.name(),
            session.token.name(),
        ] {
            session.emit(SyncEvent::CacheInvalidated { store });
        }
    }

    fn enter(&self, status: TxStatus, message: String) {
        let signature = {
            let mut state = self.state.borrow_mut();
            debug!("transaction: {} -> {}", state.status, status);
            state.status = status;
            state.message = message;
            state.history.push(status);
            state.signature
        };
        self.controller
            .session()
            .emit(SyncEvent::TransactionStatusChanged { status, signature });
    }

    fn fail(&self, err: SyncError) -> Option<Signature> {
        log!(err.log_level(), "transaction failed: {err}");
        self.state.borrow_mut().error = Some(err.clone());
        self.enter(TxStatus::Failed, err.to_string());
        None
    }
}
