//! The `SalesWarehouse` trait: read-only access to the star schema.
//!
//! The trait is implemented by storage backends (e.g.
//! `salesboard-store-sqlite`). Engines never see a backend; they work on the
//! [`Dataset`] produced by [`load_dataset`].

use std::future::Future;

use crate::{
  dataset::Dataset,
  model::{Customer, Product, SalesFact},
};

/// Abstraction over a populated sales warehouse.
///
/// Every method is a bulk read of one whole table. Implementations must not
/// mutate the underlying data.
pub trait SalesWarehouse: Send + Sync {
  type Error: std::error::Error + From<crate::Error> + Send + Sync + 'static;

  /// All rows of the fact table, in storage order.
  fn sales(
    &self,
  ) -> impl Future<Output = Result<Vec<SalesFact>, Self::Error>> + Send + '_;

  /// All rows of the customer dimension.
  fn customers(
    &self,
  ) -> impl Future<Output = Result<Vec<Customer>, Self::Error>> + Send + '_;

  /// All rows of the product dimension.
  fn products(
    &self,
  ) -> impl Future<Output = Result<Vec<Product>, Self::Error>> + Send + '_;
}

/// Read all three tables from `warehouse` and index them.
pub async fn load_dataset<W: SalesWarehouse>(
  warehouse: &W,
) -> Result<Dataset, W::Error> {
  let sales = warehouse.sales().await?;
  let customers = warehouse.customers().await?;
  let products = warehouse.products().await?;
  Ok(Dataset::new(sales, customers, products)?)
}

/// An already-loaded dataset is itself a warehouse; reads hand out copies.
impl SalesWarehouse for Dataset {
  type Error = crate::Error;

  async fn sales(&self) -> crate::Result<Vec<SalesFact>> {
    Ok(Dataset::sales(self).to_vec())
  }

  async fn customers(&self) -> crate::Result<Vec<Customer>> {
    Ok(Dataset::customers(self).to_vec())
  }

  async fn products(&self) -> crate::Result<Vec<Product>> {
    Ok(Dataset::products(self).to_vec())
  }
}
