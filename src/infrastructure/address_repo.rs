use diesel::prelude::*;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::address::{Address, AddressKind, AddressUpdate, NewAddress};
use crate::domain::errors::DomainError;
use crate::domain::ports::AddressRepository;
use crate::schema::addresses;

use super::models::{AddressRow, NewAddressRow};

pub struct DieselAddressRepository {
    pool: DbPool,
}

impl DieselAddressRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, AsChangeset)]
#[diesel(table_name = addresses)]
struct AddressChanges {
    street: Option<String>,
    city: Option<String>,
    state: Option<String>,
    postal_code: Option<String>,
    country: Option<String>,
    kind: Option<String>,
}

fn address_from_row(row: AddressRow) -> Result<Address, DomainError> {
    let kind = AddressKind::parse(&row.kind).map_err(|_| {
        DomainError::Internal(format!("address {} has unknown kind '{}'", row.id, row.kind))
    })?;
    Ok(Address {
        id: row.id,
        user_id: row.user_id,
        street: row.street,
        city: row.city,
        state: row.state,
        postal_code: row.postal_code,
        country: row.country,
        kind,
        is_default: row.is_default,
        created_at: row.created_at,
    })
}

fn load_addresses(conn: &mut PgConnection, user_id: Uuid) -> Result<Vec<Address>, DomainError> {
    let rows = addresses::table
        .filter(addresses::user_id.eq(user_id))
        .select(AddressRow::as_select())
        .order(addresses::created_at.asc())
        .load(conn)?;
    rows.into_iter().map(address_from_row).collect()
}

fn unset_defaults(conn: &mut PgConnection, user_id: Uuid) -> Result<(), DomainError> {
    diesel::update(addresses::table.filter(addresses::user_id.eq(user_id)))
        .set(addresses::is_default.eq(false))
        .execute(conn)?;
    Ok(())
}

impl AddressRepository for DieselAddressRepository {
    fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Address>, DomainError> {
        let mut conn = self.pool.get()?;
        load_addresses(&mut conn, user_id)
    }

    fn find(&self, user_id: Uuid, address_id: Uuid) -> Result<Option<Address>, DomainError> {
        let mut conn = self.pool.get()?;
        let row = addresses::table
            .filter(addresses::id.eq(address_id))
            .filter(addresses::user_id.eq(user_id))
            .select(AddressRow::as_select())
            .first(&mut conn)
            .optional()?;
        row.map(address_from_row).transpose()
    }

    /// A user's first address becomes the default regardless of the input
    /// flag; an explicit default demotes every other address in the same
    /// transaction.
    fn create(&self, user_id: Uuid, input: NewAddress) -> Result<Address, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let existing: i64 = addresses::table
                .filter(addresses::user_id.eq(user_id))
                .count()
                .get_result(conn)?;
            let is_default = input.is_default || existing == 0;
            if is_default && existing > 0 {
                unset_defaults(conn, user_id)?;
            }

            let row: AddressRow = diesel::insert_into(addresses::table)
                .values(&NewAddressRow {
                    id: Uuid::new_v4(),
                    user_id,
                    street: input.street,
                    city: input.city,
                    state: input.state,
                    postal_code: input.postal_code,
                    country: input.country,
                    kind: input.kind.as_str().to_string(),
                    is_default,
                })
                .get_result(conn)?;
            address_from_row(row)
        })
    }

    fn update(
        &self,
        user_id: Uuid,
        address_id: Uuid,
        change: AddressUpdate,
    ) -> Result<Address, DomainError> {
        if change.is_empty() {
            return self
                .find(user_id, address_id)?
                .ok_or(DomainError::NotFound);
        }
        let mut conn = self.pool.get()?;
        let row: AddressRow = diesel::update(
            addresses::table
                .filter(addresses::id.eq(address_id))
                .filter(addresses::user_id.eq(user_id)),
        )
        .set(&AddressChanges {
            street: change.street,
            city: change.city,
            state: change.state,
            postal_code: change.postal_code,
            country: change.country,
            kind: change.kind.map(|k| k.as_str().to_string()),
        })
        .get_result(&mut conn)
        .optional()?
        .ok_or(DomainError::NotFound)?;
        address_from_row(row)
    }

    /// Deleting the default promotes the earliest-created remaining address,
    /// all inside one transaction so there is never a window with zero
    /// defaults while any address exists.
    fn delete(&self, user_id: Uuid, address_id: Uuid) -> Result<Vec<Address>, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let target: AddressRow = addresses::table
                .filter(addresses::id.eq(address_id))
                .filter(addresses::user_id.eq(user_id))
                .select(AddressRow::as_select())
                .first(conn)
                .optional()?
                .ok_or(DomainError::NotFound)?;

            diesel::delete(addresses::table.filter(addresses::id.eq(target.id)))
                .execute(conn)?;

            if target.is_default {
                let next: Option<AddressRow> = addresses::table
                    .filter(addresses::user_id.eq(user_id))
                    .select(AddressRow::as_select())
                    .order(addresses::created_at.asc())
                    .first(conn)
                    .optional()?;
                if let Some(next) = next {
                    diesel::update(addresses::table.filter(addresses::id.eq(next.id)))
                        .set(addresses::is_default.eq(true))
                        .execute(conn)?;
                }
            }

            load_addresses(conn, user_id)
        })
    }

    fn set_default(&self, user_id: Uuid, address_id: Uuid) -> Result<Address, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let exists: i64 = addresses::table
                .filter(addresses::id.eq(address_id))
                .filter(addresses::user_id.eq(user_id))
                .count()
                .get_result(conn)?;
            if exists == 0 {
                return Err(DomainError::NotFound);
            }

            unset_defaults(conn, user_id)?;
            let row: AddressRow =
                diesel::update(addresses::table.filter(addresses::id.eq(address_id)))
                    .set(addresses::is_default.eq(true))
                    .get_result(conn)?;
            address_from_row(row)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::test_support::setup_db;

    fn new_address(street: &str, is_default: bool) -> NewAddress {
        NewAddress {
            street: street.to_string(),
            city: "Springfield".to_string(),
            state: "CA".to_string(),
            postal_code: "90001".to_string(),
            country: "US".to_string(),
            kind: AddressKind::Shipping,
            is_default,
        }
    }

    fn default_count(addresses: &[Address]) -> usize {
        addresses.iter().filter(|a| a.is_default).count()
    }

    #[tokio::test]
    async fn first_address_is_default_regardless_of_input() {
        let (_container, pool) = setup_db().await;
        let repo = DieselAddressRepository::new(pool);
        let user_id = Uuid::new_v4();

        let created = repo
            .create(user_id, new_address("1 Main St", false))
            .expect("create failed");
        assert!(created.is_default);
    }

    #[tokio::test]
    async fn explicit_default_demotes_the_previous_one() {
        let (_container, pool) = setup_db().await;
        let repo = DieselAddressRepository::new(pool);
        let user_id = Uuid::new_v4();

        let first = repo
            .create(user_id, new_address("1 Main St", false))
            .expect("create failed");
        let second = repo
            .create(user_id, new_address("2 Oak Ave", true))
            .expect("create failed");

        let addresses = repo.list_for_user(user_id).expect("list failed");
        assert_eq!(default_count(&addresses), 1);
        let default = addresses.iter().find(|a| a.is_default).expect("default");
        assert_eq!(default.id, second.id);
        assert_ne!(default.id, first.id);
    }

    #[tokio::test]
    async fn deleting_the_default_promotes_first_remaining() {
        let (_container, pool) = setup_db().await;
        let repo = DieselAddressRepository::new(pool);
        let user_id = Uuid::new_v4();

        let first = repo
            .create(user_id, new_address("1 Main St", false))
            .expect("create failed");
        let second = repo
            .create(user_id, new_address("2 Oak Ave", false))
            .expect("create failed");
        assert!(first.is_default);

        let remaining = repo.delete(user_id, first.id).expect("delete failed");
        assert_eq!(remaining.len(), 1);
        assert_eq!(default_count(&remaining), 1);
        assert_eq!(remaining[0].id, second.id);
        assert!(remaining[0].is_default);
    }

    #[tokio::test]
    async fn deleting_a_non_default_keeps_the_default() {
        let (_container, pool) = setup_db().await;
        let repo = DieselAddressRepository::new(pool);
        let user_id = Uuid::new_v4();

        let first = repo
            .create(user_id, new_address("1 Main St", false))
            .expect("create failed");
        let second = repo
            .create(user_id, new_address("2 Oak Ave", false))
            .expect("create failed");

        let remaining = repo.delete(user_id, second.id).expect("delete failed");
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, first.id);
        assert!(remaining[0].is_default);
    }

    #[tokio::test]
    async fn deleting_the_last_address_leaves_an_empty_list() {
        let (_container, pool) = setup_db().await;
        let repo = DieselAddressRepository::new(pool);
        let user_id = Uuid::new_v4();

        let only = repo
            .create(user_id, new_address("1 Main St", true))
            .expect("create failed");
        let remaining = repo.delete(user_id, only.id).expect("delete failed");
        assert!(remaining.is_empty());
    }

    #[tokio::test]
    async fn set_default_switches_exactly_one() {
        let (_container, pool) = setup_db().await;
        let repo = DieselAddressRepository::new(pool);
        let user_id = Uuid::new_v4();

        repo.create(user_id, new_address("1 Main St", false))
            .expect("create failed");
        let second = repo
            .create(user_id, new_address("2 Oak Ave", false))
            .expect("create failed");

        let updated = repo
            .set_default(user_id, second.id)
            .expect("set_default failed");
        assert!(updated.is_default);

        let addresses = repo.list_for_user(user_id).expect("list failed");
        assert_eq!(default_count(&addresses), 1);
    }

    #[tokio::test]
    async fn update_changes_fields_without_touching_default() {
        let (_container, pool) = setup_db().await;
        let repo = DieselAddressRepository::new(pool);
        let user_id = Uuid::new_v4();

        let created = repo
            .create(user_id, new_address("1 Main St", false))
            .expect("create failed");
        let updated = repo
            .update(
                user_id,
                created.id,
                AddressUpdate {
                    city: Some("Shelbyville".to_string()),
                    kind: Some(AddressKind::Billing),
                    ..AddressUpdate::default()
                },
            )
            .expect("update failed");

        assert_eq!(updated.city, "Shelbyville");
        assert_eq!(updated.kind, AddressKind::Billing);
        assert!(updated.is_default);
    }

    #[tokio::test]
    async fn operations_are_scoped_to_the_owner() {
        let (_container, pool) = setup_db().await;
        let repo = DieselAddressRepository::new(pool);
        let owner = Uuid::new_v4();
        let stranger = Uuid::new_v4();

        let created = repo
            .create(owner, new_address("1 Main St", false))
            .expect("create failed");

        assert!(matches!(
            repo.delete(stranger, created.id),
            Err(DomainError::NotFound)
        ));
        assert!(matches!(
            repo.set_default(stranger, created.id),
            Err(DomainError::NotFound)
        ));
    }
}
