use thiserror::Error;

#[derive(Error, Debug)]
pub enum WarehouseError {
    #[error("cannot build a warehouse with zero cells")]
    IllegalSize,

    #[error("layout rows must all have the same length")]
    IncompleteMap,

    #[error("the catalog holds no products")]
    EmptyListOfProducts,

    #[error("the warehouse holds no cells")]
    EmptyWarehouse,

    #[error("cannot dismiss more workers than the roster holds")]
    FireTooManyWorkers,

    #[error("worker count must be positive")]
    InvalidWorkerCount,

    #[error("cell {cell_id} holds no product and none was supplied")]
    UnknownStoredProduct { cell_id: i64 },
}
