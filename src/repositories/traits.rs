//! Common repository traits
//!
//! Generic interfaces for the CRUD operations shared by the repositories.
//! Operations that touch more than one table (quiz creation, room joins,
//! answers) live as inherent methods on the concrete repository.

/// Trait for creating new entities in the database
///
/// # Type Parameters
/// * `Entity` - Type of the returned entity (with ID assigned by the database)
/// * `CreateDTO` - Data needed for the insert (without ID)
pub trait Create<Entity, CreateDTO> {
    /// # Returns
    /// * `Ok(Entity)` - Created entity with ID assigned by the database
    /// * `Err(sqlx::Error)` - Error during insertion
    async fn create(&self, data: &CreateDTO) -> Result<Entity, sqlx::Error>;
}

/// Trait for reading a single entity by primary key
///
/// `Id` can be a composite key, e.g. `(i32, i32)` for participants.
pub trait Read<Entity, Id> {
    /// # Returns
    /// * `Ok(Some(Entity))` - Entity found
    /// * `Ok(None)` - No entity with that ID
    async fn read(&self, id: &Id) -> Result<Option<Entity>, sqlx::Error>;
}

/// Trait for partial updates: only `Some(_)` fields of the DTO are written
pub trait Update<Entity, UpdateDTO, Id> {
    /// # Returns
    /// * `Ok(Entity)` - Updated entity
    /// * `Err(sqlx::Error::RowNotFound)` - No entity with that ID
    async fn update(&self, id: &Id, data: &UpdateDTO) -> Result<Entity, sqlx::Error>;
}

/// Trait for deleting entities
pub trait Delete<Id> {
    /// Deleting a missing entity is not an error
    async fn delete(&self, id: &Id) -> Result<(), sqlx::Error>;
}
