use uuid::Uuid;

use crate::domain::address::{Address, AddressUpdate, NewAddress};
use crate::domain::errors::DomainError;
use crate::domain::ports::AddressRepository;

pub struct AddressService<R> {
    addresses: R,
}

impl<R: AddressRepository> AddressService<R> {
    pub fn new(addresses: R) -> Self {
        Self { addresses }
    }

    pub fn list(&self, user_id: Uuid) -> Result<Vec<Address>, DomainError> {
        self.addresses.list_for_user(user_id)
    }

    pub fn create(&self, user_id: Uuid, input: NewAddress) -> Result<Address, DomainError> {
        input.validate()?;
        self.addresses.create(user_id, input)
    }

    pub fn update(
        &self,
        user_id: Uuid,
        address_id: Uuid,
        change: AddressUpdate,
    ) -> Result<Address, DomainError> {
        self.addresses.update(user_id, address_id, change)
    }

    pub fn delete(&self, user_id: Uuid, address_id: Uuid) -> Result<Vec<Address>, DomainError> {
        self.addresses.delete(user_id, address_id)
    }

    pub fn set_default(&self, user_id: Uuid, address_id: Uuid) -> Result<Address, DomainError> {
        self.addresses.set_default(user_id, address_id)
    }
}
