//! SeaORM implementation of CustomerRepository

use async_trait::async_trait;
use log::debug;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, NotSet, QueryFilter,
    QueryOrder, Set,
};

use super::{db_err, is_unique_violation};
use crate::domain::customer::{Customer, CustomerRepository};
use crate::domain::{DomainError, DomainResult};
use crate::infrastructure::database::entities::user;

pub struct SeaOrmCustomerRepository {
    db: DatabaseConnection,
}

impl SeaOrmCustomerRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn model_to_domain(m: user::Model) -> Customer {
    Customer {
        id: m.id,
        name: m.name,
        civil_id: m.civil_id,
        phone: m.phone,
        created_at: m.created_at,
    }
}

#[async_trait]
impl CustomerRepository for SeaOrmCustomerRepository {
    async fn save(&self, c: Customer) -> DomainResult<Customer> {
        debug!("Registering customer with civil id {}", c.civil_id);

        let model = user::ActiveModel {
            id: NotSet,
            name: Set(c.name),
            civil_id: Set(c.civil_id.clone()),
            phone: Set(c.phone),
            created_at: Set(c.created_at),
        };
        let inserted = model.insert(&self.db).await.map_err(|e| {
            if is_unique_violation(&e) {
                DomainError::Conflict(format!("Civil id {} is already registered", c.civil_id))
            } else {
                db_err(e)
            }
        })?;
        Ok(model_to_domain(inserted))
    }

    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Customer>> {
        let model = user::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.map(model_to_domain))
    }

    async fn find_by_civil_id(&self, civil_id: &str) -> DomainResult<Option<Customer>> {
        let model = user::Entity::find()
            .filter(user::Column::CivilId.eq(civil_id))
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.map(model_to_domain))
    }

    async fn find_by_phone(&self, phone: &str) -> DomainResult<Option<Customer>> {
        let model = user::Entity::find()
            .filter(user::Column::Phone.eq(phone))
            .order_by_desc(user::Column::Id)
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.map(model_to_domain))
    }

    async fn update_phone(&self, id: i32, phone: &str) -> DomainResult<()> {
        let result = user::Entity::update_many()
            .col_expr(user::Column::Phone, Expr::value(phone))
            .filter(user::Column::Id.eq(id))
            .exec(&self.db)
            .await
            .map_err(db_err)?;

        if result.rows_affected == 0 {
            return Err(DomainError::not_found("Customer", id));
        }
        Ok(())
    }
}
