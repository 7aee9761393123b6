use sqlx::PgConnection;

/// A handle to an active database connection. Abstracts over whether the connection
/// came straight from a pool or is participating in a transaction.
pub trait ConnectionHandle {
    fn borrow_connection(&mut self) -> &mut PgConnection;
}

/// Owns the clients used to talk to systems outside this process (the database and
/// plain HTTP services). Business logic receives an implementation of this trait so
/// driven adapters can be swapped for fakes in tests.
pub trait ExternalConnectivity: Sync {
    type DbHandle<'cxn_borrow>: ConnectionHandle
    where
        Self: 'cxn_borrow;

    /// Acquires a database connection
    async fn database_cxn(&mut self) -> Result<Self::DbHandle<'_>, anyhow::Error>;

    /// Borrows the shared HTTP client
    fn http_client(&self) -> &reqwest_middleware::ClientWithMiddleware;
}

/// Implemented by connectivity types which can open a database transaction,
/// producing a new connectivity value whose queries all participate in it.
pub trait Transactable: Sync {
    type Handle: ExternalConnectivity + TransactionHandle;

    async fn start_transaction(&self) -> Result<Self::Handle, anyhow::Error>;
}

/// A started transaction which must be explicitly committed. Dropping the handle
/// without committing rolls the transaction back.
pub trait TransactionHandle {
    async fn commit(self) -> Result<(), anyhow::Error>;
}

/// Convenience trait for functions which need to both run queries and open transactions.
pub trait TransactableExternalConnectivity: ExternalConnectivity + Transactable {}
impl<T: ExternalConnectivity + Transactable> TransactableExternalConnectivity for T {}
