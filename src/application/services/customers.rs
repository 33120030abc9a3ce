//! Customer registration for the kiosk sign-in flow

use std::sync::Arc;

use tracing::info;

use crate::domain::customer::Customer;
use crate::domain::{DomainResult, RepositoryProvider};
use crate::shared::errors::DomainError;

pub struct CustomerService {
    repos: Arc<dyn RepositoryProvider>,
}

impl CustomerService {
    pub fn new(repos: Arc<dyn RepositoryProvider>) -> Self {
        Self { repos }
    }

    /// Return the customer registered under `civil_id`, updating the
    /// contact phone, or register a new one.
    pub async fn register(&self, name: &str, civil_id: &str, phone: &str) -> DomainResult<Customer> {
        let (name, civil_id, phone) = (name.trim(), civil_id.trim(), phone.trim());
        for (field, value) in [("name", name), ("civil_id", civil_id), ("phone", phone)] {
            if value.is_empty() {
                return Err(DomainError::Validation(format!("{} must not be empty", field)));
            }
        }

        let customers = self.repos.customers();
        if let Some(mut existing) = customers.find_by_civil_id(civil_id).await? {
            if existing.phone != phone {
                customers.update_phone(existing.id, phone).await?;
                existing.phone = phone.to_string();
                info!(user_id = existing.id, "Customer phone updated");
            }
            return Ok(existing);
        }

        match customers.save(Customer::new(name, civil_id, phone)).await {
            Ok(customer) => {
                info!(user_id = customer.id, "Customer registered");
                Ok(customer)
            }
            // Registered concurrently under the same civil id
            Err(DomainError::Conflict(_)) => customers
                .find_by_civil_id(civil_id)
                .await?
                .ok_or_else(|| DomainError::Conflict(format!("Civil id {} already registered", civil_id))),
            Err(e) => Err(e),
        }
    }

    pub async fn find(&self, user_id: i32) -> DomainResult<Customer> {
        self.repos
            .customers()
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Customer", user_id))
    }

    pub async fn find_by_civil_id(&self, civil_id: &str) -> DomainResult<Customer> {
        self.repos
            .customers()
            .find_by_civil_id(civil_id.trim())
            .await?
            .ok_or_else(|| DomainError::NotFound {
                entity: "Customer",
                field: "civil_id",
                value: civil_id.to_string(),
            })
    }

    pub async fn find_by_phone(&self, phone: &str) -> DomainResult<Customer> {
        self.repos
            .customers()
            .find_by_phone(phone.trim())
            .await?
            .ok_or_else(|| DomainError::NotFound {
                entity: "Customer",
                field: "phone",
                value: phone.to_string(),
            })
    }

    /// Kiosk sign-in: `credential` is either a civil id or a phone number.
    /// Civil ids are tried first since they are unique.
    pub async fn identify(&self, credential: &str) -> DomainResult<Customer> {
        let credential = credential.trim();
        if credential.is_empty() {
            return Err(DomainError::Validation("credential must not be empty".into()));
        }
        let customers = self.repos.customers();
        if let Some(customer) = customers.find_by_civil_id(credential).await? {
            return Ok(customer);
        }
        customers
            .find_by_phone(credential)
            .await?
            .ok_or_else(|| DomainError::NotFound {
                entity: "Customer",
                field: "credential",
                value: credential.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::test_support::venue;

    #[tokio::test]
    async fn register_creates_then_reuses_by_civil_id() {
        let v = venue().await;
        let service = CustomerService::new(v.repos.clone());

        let created = service
            .register("Layla", "290010100009", "55511111")
            .await
            .unwrap();
        assert!(created.id > 0);

        let again = service
            .register("Layla A.", " 290010100009 ", "55522222")
            .await
            .unwrap();
        assert_eq!(again.id, created.id);
        assert_eq!(again.name, "Layla");
        assert_eq!(again.phone, "55522222");
        assert_eq!(service.find(created.id).await.unwrap().phone, "55522222");
    }

    #[tokio::test]
    async fn register_validates_fields() {
        let v = venue().await;
        let service = CustomerService::new(v.repos.clone());
        for (name, civil, phone) in [("", "1", "2"), ("a", " ", "2"), ("a", "1", "")] {
            assert!(matches!(
                service.register(name, civil, phone).await,
                Err(DomainError::Validation(_))
            ));
        }
    }

    #[tokio::test]
    async fn lookups_report_not_found() {
        let v = venue().await;
        let service = CustomerService::new(v.repos.clone());
        assert!(matches!(
            service.find(999).await,
            Err(DomainError::NotFound { .. })
        ));
        assert!(matches!(
            service.find_by_civil_id("000").await,
            Err(DomainError::NotFound { field: "civil_id", .. })
        ));
        assert_eq!(
            service.find_by_civil_id("290010100001").await.unwrap().id,
            v.customers[0]
        );
    }

    #[tokio::test]
    async fn identify_accepts_civil_id_or_phone() {
        let v = venue().await;
        let service = CustomerService::new(v.repos.clone());
        let layla = service
            .register("Layla", "290010100009", "55577777")
            .await
            .unwrap();

        assert_eq!(service.identify("290010100009").await.unwrap().id, layla.id);
        assert_eq!(service.identify(" 55577777 ").await.unwrap().id, layla.id);
        assert_eq!(service.find_by_phone("55577777").await.unwrap().id, layla.id);
        assert!(matches!(
            service.identify("55599999").await,
            Err(DomainError::NotFound { field: "credential", .. })
        ));
        assert!(matches!(
            service.identify("  ").await,
            Err(DomainError::Validation(_))
        ));
        assert!(matches!(
            service.find_by_phone("55599999").await,
            Err(DomainError::NotFound { field: "phone", .. })
        ));
    }
}
