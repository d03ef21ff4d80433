#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::convert::TryInto;

use anchor_lang::AccountSerialize;
use litesvm::LiteSVM;
use nft_vault_client::derivation::{PositionAddresses, ProgramAddresses, VaultAddresses};
use nft_vault_client::state::{Collection, CollectionItem, UserInfo, VaultState};
use nft_vault_client::{
    ConnectionState, LedgerRpc, RpcError, Session, SignerError, SyncConfig, SyncController,
    WalletSigner,
};
use solana_sdk::{
    account::Account,
    hash::Hash,
    pubkey::Pubkey,
    signature::{Keypair, Signature},
    signer::Signer,
    transaction::Transaction,
};
use tokio::sync::Notify;

// ---------------------------------------------------------------------------
// Program IDs
// ---------------------------------------------------------------------------
pub const PROGRAM_ID: Pubkey = nft_vault_client::ID;
pub const TOKEN_PROGRAM_ID: Pubkey =
    solana_sdk::pubkey!("TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA");
pub const TOKEN_2022_PROGRAM_ID: Pubkey =
    solana_sdk::pubkey!("TokenzQdBNbLqP5VEhdkAS6EPFLC1PHnBqCXEpPxuEb");
pub const ATA_PROGRAM_ID: Pubkey =
    solana_sdk::pubkey!("ATokenGPvbdGVxr1b2hvZbsiqW5xWH25efTNsLJA8knL");

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------
pub const INITIAL_LAMPORTS: u64 = 1_000_000_000;
pub const NETWORK: &str = "devnet";

// PDA seeds (must match constants.rs in the client)
pub const VAULT_SEED: &[u8] = b"vault";
pub const COLLECTION_SEED: &[u8] = b"collection";
pub const USER_SHARES_SEED: &[u8] = b"user_shares";
pub const USER_INFO_SEED: &[u8] = b"user_info";

pub fn deposit_mint() -> Pubkey {
    Pubkey::new_from_array([5u8; 32])
}

pub fn share_mint() -> Pubkey {
    Pubkey::new_from_array([3u8; 32])
}

pub fn nft_mint(byte: u8) -> Pubkey {
    Pubkey::new_from_array([byte; 32])
}

// ---------------------------------------------------------------------------
// Independent derivation helpers
// ---------------------------------------------------------------------------
pub fn derive_ata(owner: &Pubkey, mint: &Pubkey, token_program: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(
        &[owner.as_ref(), token_program.as_ref(), mint.as_ref()],
        &ATA_PROGRAM_ID,
    )
    .0
}

pub fn find_vault_pda() -> (Pubkey, u8) {
    Pubkey::find_program_address(&[VAULT_SEED], &PROGRAM_ID)
}

pub fn find_collection_pda() -> (Pubkey, u8) {
    Pubkey::find_program_address(&[COLLECTION_SEED], &PROGRAM_ID)
}

pub fn find_user_shares_pda(nft_mint: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[USER_SHARES_SEED, nft_mint.as_ref()], &PROGRAM_ID)
}

pub fn find_user_info_pda(nft_token_account: &Pubkey, shares_token_account: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(
        &[
            USER_INFO_SEED,
            nft_token_account.as_ref(),
            shares_token_account.as_ref(),
        ],
        &PROGRAM_ID,
    )
}

pub fn program_addresses() -> ProgramAddresses {
    ProgramAddresses::derive(&PROGRAM_ID, &TOKEN_PROGRAM_ID).unwrap()
}

// ---------------------------------------------------------------------------
// Account fixtures
// ---------------------------------------------------------------------------
pub fn vault_state(total_shares: u64) -> VaultState {
    VaultState {
        authority: Pubkey::new_from_array([1u8; 32]),
        deposit_mint: deposit_mint(),
        share_mint: share_mint(),
        collection: Pubkey::new_from_array([2u8; 32]),
        total_shares,
        total_deposited: total_shares,
        bump: find_vault_pda().1,
    }
}

pub fn user_info(owner: &Pubkey, nft_mint: &Pubkey, shares: u64) -> UserInfo {
    UserInfo {
        owner: *owner,
        nft_mint: *nft_mint,
        shares,
        deposited: shares,
        last_update: 1_700_000_000,
        bump: 255,
    }
}

pub fn collection(items: &[(Pubkey, u32)]) -> Collection {
    Collection {
        authority: Pubkey::new_from_array([1u8; 32]),
        collection_mint: Pubkey::new_from_array([2u8; 32]),
        name: "Vault Keys".to_string(),
        items: items
            .iter()
            .map(|(mint, id)| CollectionItem { mint: *mint, id: *id })
            .collect(),
        bump: find_collection_pda().1,
    }
}

/// Discriminator-prefixed account owned by `owner`
pub fn record_account<T: AccountSerialize>(record: &T, owner: &Pubkey) -> Account {
    let mut data = Vec::new();
    record.try_serialize(&mut data).unwrap();
    Account {
        lamports: INITIAL_LAMPORTS,
        data,
        owner: *owner,
        executable: false,
        rent_epoch: 0,
    }
}

/// SPL token account layout: mint, owner, amount, then zeroed optional fields
pub fn token_account(mint: &Pubkey, owner: &Pubkey, amount: u64) -> Account {
    let mut data = vec![0u8; 165];
    data[0..32].copy_from_slice(mint.as_ref());
    data[32..64].copy_from_slice(owner.as_ref());
    data[64..72].copy_from_slice(&amount.to_le_bytes());
    data[108] = 1; // AccountState::Initialized
    Account {
        lamports: INITIAL_LAMPORTS,
        data,
        owner: TOKEN_PROGRAM_ID,
        executable: false,
        rent_epoch: 0,
    }
}

pub fn read_token_amount(account: &Account) -> u64 {
    u64::from_le_bytes(account.data[64..72].try_into().unwrap())
}

// ---------------------------------------------------------------------------
// Scripted ledger
// ---------------------------------------------------------------------------

/// In-memory ledger that counts requests and can pause one of them
#[derive(Default)]
pub struct MockLedger {
    pub accounts: RefCell<HashMap<Pubkey, Account>>,
    pub balances: RefCell<HashMap<Pubkey, u64>>,
    /// Addresses whose reads fail with a transport error
    pub failing: RefCell<HashSet<Pubkey>>,
    pub account_requests: RefCell<Vec<Pubkey>>,
    pub balance_requests: RefCell<Vec<Pubkey>>,
    pub blockhash_requests: Cell<usize>,
    pub sent: RefCell<Vec<Transaction>>,
    /// Returned by the next `send_and_confirm` instead of a signature
    pub send_error: RefCell<Option<RpcError>>,
    held: RefCell<Option<Pubkey>>,
    requested: Notify,
    gate: Notify,
}

impl MockLedger {
    pub fn put<T: AccountSerialize>(&self, address: Pubkey, record: &T) {
        self.put_account(address, record_account(record, &PROGRAM_ID));
    }

    pub fn put_account(&self, address: Pubkey, account: Account) {
        self.accounts.borrow_mut().insert(address, account);
    }

    pub fn put_balance(&self, address: Pubkey, amount: u64) {
        self.balances.borrow_mut().insert(address, amount);
    }

    pub fn fail(&self, address: Pubkey) {
        self.failing.borrow_mut().insert(address);
    }

    pub fn heal(&self, address: &Pubkey) {
        self.failing.borrow_mut().remove(address);
    }

    /// Pauses the next read of `address` until `release` is called
    pub fn hold(&self, address: Pubkey) {
        *self.held.borrow_mut() = Some(address);
    }

    /// Resolves once the held read has been issued
    pub async fn wait_requested(&self) {
        self.requested.notified().await;
    }

    pub fn release(&self) {
        self.gate.notify_one();
    }

    pub fn account_calls(&self, address: &Pubkey) -> usize {
        self.account_requests
            .borrow()
            .iter()
            .filter(|a| *a == address)
            .count()
    }

    pub fn total_account_calls(&self) -> usize {
        self.account_requests.borrow().len()
    }

    pub fn total_calls(&self) -> usize {
        self.account_requests.borrow().len()
            + self.balance_requests.borrow().len()
            + self.blockhash_requests.get()
            + self.sent.borrow().len()
    }

    async fn pause_if_held(&self, address: &Pubkey) {
        let held = {
            let mut held = self.held.borrow_mut();
            if *held == Some(*address) {
                *held = None;
                true
            } else {
                false
            }
        };
        if held {
            self.requested.notify_one();
            self.gate.notified().await;
        }
    }

    fn check_failing(&self, address: &Pubkey) -> Result<(), RpcError> {
        if self.failing.borrow().contains(address) {
            return Err(RpcError::Transport("connection reset by peer".into()));
        }
        Ok(())
    }
}

impl LedgerRpc for MockLedger {
    async fn get_account(&self, address: &Pubkey) -> Result<Option<Account>, RpcError> {
        self.account_requests.borrow_mut().push(*address);
        self.pause_if_held(address).await;
        self.check_failing(address)?;
        Ok(self.accounts.borrow().get(address).cloned())
    }

    async fn get_token_account_balance(&self, address: &Pubkey) -> Result<Option<u64>, RpcError> {
        self.balance_requests.borrow_mut().push(*address);
        self.pause_if_held(address).await;
        self.check_failing(address)?;
        Ok(self.balances.borrow().get(address).copied())
    }

    async fn latest_blockhash(&self) -> Result<Hash, RpcError> {
        self.blockhash_requests.set(self.blockhash_requests.get() + 1);
        Ok(Hash::new_from_array([42u8; 32]))
    }

    async fn send_and_confirm(&self, transaction: &Transaction) -> Result<Signature, RpcError> {
        self.sent.borrow_mut().push(transaction.clone());
        if let Some(err) = self.send_error.borrow_mut().take() {
            return Err(err);
        }
        Ok(transaction.signatures[0])
    }
}

// ---------------------------------------------------------------------------
// LiteSVM-backed ledger
// ---------------------------------------------------------------------------
pub struct SvmLedger {
    pub svm: RefCell<LiteSVM>,
}

impl SvmLedger {
    pub fn new() -> Self {
        Self {
            svm: RefCell::new(LiteSVM::new()),
        }
    }
}

impl LedgerRpc for SvmLedger {
    async fn get_account(&self, address: &Pubkey) -> Result<Option<Account>, RpcError> {
        Ok(self.svm.borrow().get_account(address))
    }

    async fn get_token_account_balance(&self, address: &Pubkey) -> Result<Option<u64>, RpcError> {
        Ok(self
            .svm
            .borrow()
            .get_account(address)
            .map(|account| read_token_amount(&account)))
    }

    async fn latest_blockhash(&self) -> Result<Hash, RpcError> {
        Ok(self.svm.borrow().latest_blockhash())
    }

    async fn send_and_confirm(&self, transaction: &Transaction) -> Result<Signature, RpcError> {
        self.svm
            .borrow_mut()
            .send_transaction(transaction.clone())
            .map(|meta| meta.signature)
            .map_err(|failed| RpcError::Rejected {
                message: failed.err.to_string(),
                logs: failed.meta.logs,
            })
    }
}

// ---------------------------------------------------------------------------
// Wallet signer
// ---------------------------------------------------------------------------
pub struct MockSigner {
    pub keypair: Keypair,
    pub reject: Cell<bool>,
    pub calls: Cell<usize>,
}

impl MockSigner {
    pub fn new() -> Self {
        Self {
            keypair: Keypair::new(),
            reject: Cell::new(false),
            calls: Cell::new(0),
        }
    }
}

impl WalletSigner for MockSigner {
    fn pubkey(&self) -> Pubkey {
        self.keypair.pubkey()
    }

    async fn sign_transaction(&self, mut transaction: Transaction) -> Result<Transaction, SignerError> {
        self.calls.set(self.calls.get() + 1);
        if self.reject.get() {
            return Err(SignerError::Rejected);
        }
        let blockhash = transaction.message.recent_blockhash;
        transaction
            .try_sign(&[&self.keypair], blockhash)
            .map_err(|e| SignerError::Unavailable(e.to_string()))?;
        Ok(transaction)
    }
}

// ---------------------------------------------------------------------------
// Setup
// ---------------------------------------------------------------------------

/// Everything a controller borrows, owned in one place
pub struct Harness {
    pub config: SyncConfig,
    pub ledger: MockLedger,
    pub session: Session,
    pub signer: MockSigner,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(SyncConfig::default())
    }

    pub fn with_config(config: SyncConfig) -> Self {
        Self {
            config,
            ledger: MockLedger::default(),
            session: Session::new(),
            signer: MockSigner::new(),
        }
    }

    pub fn controller(&self) -> SyncController<'_, MockLedger> {
        SyncController::new(&self.config, &self.ledger, &self.session)
    }

    pub fn wallet(&self) -> Pubkey {
        self.signer.pubkey()
    }

    pub fn connected(&self) -> ConnectionState {
        ConnectionState::connected(self.wallet(), NETWORK)
    }

    pub fn position_addresses(&self, nft_mint: &Pubkey) -> PositionAddresses {
        PositionAddresses::derive(&program_addresses(), &self.wallet(), nft_mint, &share_mint())
            .unwrap()
    }

    pub fn pool_account(&self) -> Pubkey {
        VaultAddresses::derive(&program_addresses(), &vault_state(0))
            .unwrap()
            .vault_token_account
    }

    /// Vault with `total_shares` outstanding and `pool_balance` deposit tokens pooled
    pub fn plant_vault(&self, total_shares: u64, pool_balance: u64) {
        self.ledger
            .put(program_addresses().vault, &vault_state(total_shares));
        self.ledger.put_balance(self.pool_account(), pool_balance);
    }

    pub fn plant_position(&self, nft_mint: &Pubkey, shares: u64) -> PositionAddresses {
        let addresses = self.position_addresses(nft_mint);
        self.ledger.put(
            addresses.user_info,
            &user_info(&self.wallet(), nft_mint, shares),
        );
        addresses
    }

    /// User's token account for the deposit mint, planted with `amount`
    pub fn plant_token_balance(&self, amount: u64) -> Pubkey {
        let account = derive_ata(&self.wallet(), &deposit_mint(), &TOKEN_PROGRAM_ID);
        self.ledger.put_balance(account, amount);
        account
    }
}
