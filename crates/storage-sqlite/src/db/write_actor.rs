//! Single writer thread. Every mutation runs on one connection inside an
//! immediate transaction, so writers never contend for the SQLite lock.

use diesel::SqliteConnection;
use log::{debug, error};
use tokio::sync::{mpsc, oneshot};

use foodrescue_core::Result;

use super::DbPool;
use crate::errors::StorageError;

type Job = Box<dyn FnOnce(&mut SqliteConnection) + Send + 'static>;

#[derive(Clone)]
pub struct WriteHandle {
    sender: mpsc::UnboundedSender<Job>,
}

pub fn spawn_writer(pool: DbPool) -> WriteHandle {
    let (sender, mut receiver) = mpsc::unbounded_channel::<Job>();

    let spawned = std::thread::Builder::new()
        .name("foodrescue-db-writer".to_string())
        .spawn(move || {
            let mut conn = match pool.get() {
                Ok(conn) => conn,
                Err(err) => {
                    error!("[Storage] Writer could not get a connection: {}", err);
                    return;
                }
            };
            while let Some(job) = receiver.blocking_recv() {
                job(&mut *conn);
            }
            debug!("[Storage] Writer stopped");
        });
    if let Err(err) = spawned {
        error!("[Storage] Failed to start writer thread: {}", err);
    }

    WriteHandle { sender }
}

impl WriteHandle {
    /// Runs `job` on the writer connection in an immediate transaction.
    /// An error from `job` rolls the transaction back.
    pub async fn exec<F, T>(&self, job: F) -> Result<T>
    where
        F: FnOnce(&mut SqliteConnection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let (reply, response) = oneshot::channel();
        let task: Job = Box::new(move |conn| {
            let outcome = conn
                .immediate_transaction::<T, StorageError, _>(|tx| {
                    job(tx).map_err(StorageError::from)
                })
                .map_err(foodrescue_core::Error::from);
            let _ = reply.send(outcome);
        });

        self.sender
            .send(task)
            .map_err(|_| StorageError::Writer("write actor is not running".to_string()))?;
        response
            .await
            .map_err(|_| StorageError::Writer("write actor dropped the reply".to_string()))?
    }
}
