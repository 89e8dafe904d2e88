use std::sync::Arc;

use crate::errors::AppError;
use smartlock_types::domain::product::{Product, ProductDraft};
use smartlock_types::ports::CatalogRepository;

pub struct CatalogService<R: CatalogRepository> {
    repo: Arc<R>,
}

impl<R: CatalogRepository> CatalogService<R> {
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub async fn list_products(&self) -> Result<Vec<Product>, AppError> {
        Ok(self.repo.list_products().await?)
    }

    pub async fn get_product(&self, id: i64) -> Result<Product, AppError> {
        self.repo
            .get_product(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("product {id}")))
    }

    pub async fn create_product(&self, draft: ProductDraft) -> Result<Product, AppError> {
        let product = self.repo.create_product(draft.validate()?).await?;
        tracing::info!(product_id = product.id, name = %product.name, "product created");
        Ok(product)
    }

    /// Full replacement; `stock` is set to the submitted value.
    pub async fn update_product(&self, id: i64, draft: ProductDraft) -> Result<Product, AppError> {
        let product = draft.validate()?;
        let updated = self
            .repo
            .update_product(id, product)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;
        tracing::info!(product_id = id, stock = updated.stock, "product updated");
        Ok(updated)
    }

    pub async fn delete_product(&self, id: i64) -> Result<(), AppError> {
        if self.repo.delete_product(id).await? {
            tracing::info!(product_id = id, "product deleted");
            Ok(())
        } else {
            Err(AppError::NotFound(format!("product {id}")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use smartlock_repo::memory::InMemoryRepo;

    fn draft(name: &str, stock: i64) -> ProductDraft {
        ProductDraft {
            name: name.into(),
            description: "Slim slot".into(),
            price: Some(Decimal::new(8999, 2)),
            image: None,
            category: "fietsslot".into(),
            stock: Some(stock),
            features: None,
        }
    }

    #[tokio::test]
    async fn crud_round() {
        let svc = CatalogService::new(Arc::new(InMemoryRepo::new()));
        let p = svc.create_product(draft("Pro", 10)).await.unwrap();
        assert_eq!(svc.list_products().await.unwrap().len(), 1);

        let updated = svc.update_product(p.id, draft("Pro 2", 3)).await.unwrap();
        assert_eq!(updated.stock, 3);
        assert_eq!(svc.get_product(p.id).await.unwrap().name, "Pro 2");

        svc.delete_product(p.id).await.unwrap();
        assert!(matches!(
            svc.get_product(p.id).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            svc.delete_product(p.id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn invalid_drafts_are_rejected() {
        let svc = CatalogService::new(Arc::new(InMemoryRepo::new()));
        let res = svc.create_product(draft("", -1)).await;
        match res {
            Err(AppError::Validation(v)) => {
                assert_eq!(v.fields().collect::<Vec<_>>(), vec!["name", "stock"])
            }
            other => panic!("unexpected: {other:?}"),
        }
        assert!(svc.list_products().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn prices_beyond_the_cap_are_rejected() {
        let svc = CatalogService::new(Arc::new(InMemoryRepo::new()));
        let p = svc.create_product(draft("Pro", 5)).await.unwrap();

        let mut huge = draft("Pro", 5);
        huge.price = Some(Decimal::MAX);
        for res in [
            svc.create_product(huge.clone()).await,
            svc.update_product(p.id, huge).await,
        ] {
            match res {
                Err(AppError::Validation(v)) => {
                    assert_eq!(v.fields().collect::<Vec<_>>(), vec!["price"])
                }
                other => panic!("unexpected: {other:?}"),
            }
        }
        assert_eq!(svc.get_product(p.id).await.unwrap().price, Decimal::new(8999, 2));
    }

    #[tokio::test]
    async fn updating_a_missing_product_is_not_found() {
        let svc = CatalogService::new(Arc::new(InMemoryRepo::new()));
        assert!(matches!(
            svc.update_product(42, draft("Ghost", 1)).await,
            Err(AppError::NotFound(_))
        ));
    }
}
