//! Account Repository - in-memory store
//!
//! Lưu accounts theo số tài khoản, giữ thứ tự insert cho `list()`.
//! Một teller, một thread: mutation cần `&mut self`, không có locking.

use crate::error::{PersistenceError, PersistenceResult};
use std::collections::HashMap;
use tellerbank_core::{Account, AccountId, CoreResult, NewAccount};
use tracing::debug;

const ENTITY: &str = "Account";

/// Repository cho accounts
#[derive(Debug, Default)]
pub struct AccountRepository {
    accounts: HashMap<AccountId, Account>,
    /// Thứ tự insert
    order: Vec<AccountId>,
}

impl AccountRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Thêm account mới với ID ngẫu nhiên, trả về ID
    pub fn create(&mut self, new: NewAccount) -> AccountId {
        let mut id = AccountId::generate();
        while self.accounts.contains_key(&id) {
            id = AccountId::generate();
        }
        self.store(id, new);
        id
    }

    /// Thêm account với ID do caller cung cấp
    pub fn insert_with_id(&mut self, id: AccountId, new: NewAccount) -> PersistenceResult<AccountId> {
        if self.accounts.contains_key(&id) {
            return Err(PersistenceError::duplicate_id(ENTITY, &id.to_string()));
        }
        self.store(id, new);
        Ok(id)
    }

    fn store(&mut self, id: AccountId, new: NewAccount) {
        debug!(account_id = %id, "storing account");
        self.accounts.insert(id, Account::open(id, new));
        self.order.push(id);
    }

    /// Lấy account theo ID
    pub fn find(&self, id: &AccountId) -> PersistenceResult<&Account> {
        self.accounts
            .get(id)
            .ok_or_else(|| PersistenceError::not_found(ENTITY, &id.to_string()))
    }

    pub fn contains(&self, id: &AccountId) -> bool {
        self.accounts.contains_key(id)
    }

    /// Xóa account, trả về account đã xóa
    pub fn remove(&mut self, id: &AccountId) -> PersistenceResult<Account> {
        let account = self
            .accounts
            .remove(id)
            .ok_or_else(|| PersistenceError::not_found(ENTITY, &id.to_string()))?;
        self.order.retain(|existing| existing != id);
        Ok(account)
    }

    /// Áp dụng mutation lên account.
    ///
    /// Mutation chạy trên bản copy; chỉ commit khi trả về `Ok`.
    pub fn update<F, T>(&mut self, id: &AccountId, mutation: F) -> PersistenceResult<T>
    where
        F: FnOnce(&mut Account) -> CoreResult<T>,
    {
        let stored = self
            .accounts
            .get_mut(id)
            .ok_or_else(|| PersistenceError::not_found(ENTITY, &id.to_string()))?;

        let mut working = stored.clone();
        let result = mutation(&mut working)?;
        *stored = working;
        Ok(result)
    }

    /// Tất cả accounts theo thứ tự insert
    pub fn list(&self) -> Vec<&Account> {
        self.order
            .iter()
            .filter_map(|id| self.accounts.get(id))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}
