//! Actor surface for the ride registry
//!
//! This module exposes the registry as an RPC-style surface using Tokio
//! message passing:
//! - A cloneable [`RegistryHandle`] per caller (passenger or driver apps)
//! - A bounded mailbox for backpressure
//! - One oneshot response channel per operation
//!
//! Unlike a single-writer actor, each message is dispatched on its own
//! task: the registry's per-entry locks already make every transition
//! atomic per ride, so serializing unrelated rides behind one loop would
//! only cost throughput.

use crate::types::{CallerId, Location, Ride, RideId};
use crate::{Error, Result, RideRegistry};
use rust_decimal::Decimal;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

/// Message sent to the registry actor
#[derive(Debug)]
pub enum RegistryMessage {
    /// Create a new pending ride
    CreateRide {
        /// Requesting passenger
        caller: CallerId,
        /// Pickup coordinates
        pickup: Location,
        /// Dropoff coordinates
        dropoff: Location,
        /// Fare amount
        price: Decimal,
        /// Response channel
        response: oneshot::Sender<Result<Ride>>,
    },

    /// Look up a ride
    GetRide {
        /// Ride to look up
        id: RideId,
        /// Response channel
        response: oneshot::Sender<Option<Ride>>,
    },

    /// List rides requested by a passenger
    PassengerRides {
        /// Passenger identity
        caller: CallerId,
        /// Response channel
        response: oneshot::Sender<Vec<Ride>>,
    },

    /// List rides waiting for a driver
    AvailableRides {
        /// Response channel
        response: oneshot::Sender<Vec<Ride>>,
    },

    /// List rides assigned to a driver
    DriverRides {
        /// Driver identity
        caller: CallerId,
        /// Response channel
        response: oneshot::Sender<Vec<Ride>>,
    },

    /// Claim a pending ride
    AcceptRide {
        /// Accepting driver
        caller: CallerId,
        /// Ride to accept
        id: RideId,
        /// Response channel
        response: oneshot::Sender<Result<Ride>>,
    },

    /// Finish an accepted ride
    CompleteRide {
        /// Assigned driver
        caller: CallerId,
        /// Ride to complete
        id: RideId,
        /// Response channel
        response: oneshot::Sender<Result<Ride>>,
    },

    /// Withdraw a pending ride
    CancelRide {
        /// Requesting passenger
        caller: CallerId,
        /// Ride to cancel
        id: RideId,
        /// Response channel
        response: oneshot::Sender<Result<Ride>>,
    },

    /// Shutdown actor
    Shutdown {
        /// Acked once the actor loop has stopped
        response: oneshot::Sender<()>,
    },
}

/// Actor that processes registry messages
#[derive(Debug)]
pub struct RegistryActor {
    /// Shared registry state
    registry: Arc<RideRegistry>,

    /// Mailbox for incoming messages
    mailbox: mpsc::Receiver<RegistryMessage>,
}

impl RegistryActor {
    /// Create new actor
    pub fn new(registry: Arc<RideRegistry>, mailbox: mpsc::Receiver<RegistryMessage>) -> Self {
        Self { registry, mailbox }
    }

    /// Run the actor event loop
    pub async fn run(mut self) {
        while let Some(msg) = self.mailbox.recv().await {
            match msg {
                RegistryMessage::Shutdown { response } => {
                    let _ = response.send(());
                    break;
                }
                msg => {
                    // Fan out so distinct rides never queue behind each
                    // other; per-ride ordering comes from the entry locks.
                    let registry = Arc::clone(&self.registry);
                    tokio::spawn(async move {
                        Self::dispatch(&registry, msg);
                    });
                }
            }
        }
        tracing::debug!("Registry actor stopped");
    }

    /// Handle a single message
    fn dispatch(registry: &RideRegistry, msg: RegistryMessage) {
        match msg {
            RegistryMessage::CreateRide {
                caller,
                pickup,
                dropoff,
                price,
                response,
            } => {
                let _ = response.send(registry.create_ride(&caller, pickup, dropoff, price));
            }

            RegistryMessage::GetRide { id, response } => {
                let _ = response.send(registry.get_ride(id));
            }

            RegistryMessage::PassengerRides { caller, response } => {
                let _ = response.send(registry.passenger_rides(&caller));
            }

            RegistryMessage::AvailableRides { response } => {
                let _ = response.send(registry.available_rides());
            }

            RegistryMessage::DriverRides { caller, response } => {
                let _ = response.send(registry.driver_rides(&caller));
            }

            RegistryMessage::AcceptRide {
                caller,
                id,
                response,
            } => {
                let _ = response.send(registry.accept_ride(&caller, id));
            }

            RegistryMessage::CompleteRide {
                caller,
                id,
                response,
            } => {
                let _ = response.send(registry.complete_ride(&caller, id));
            }

            RegistryMessage::CancelRide {
                caller,
                id,
                response,
            } => {
                let _ = response.send(registry.cancel_ride(&caller, id));
            }

            RegistryMessage::Shutdown { .. } => {
                // Handled in main loop
            }
        }
    }
}

/// Handle for sending messages to the actor
#[derive(Clone, Debug)]
pub struct RegistryHandle {
    sender: mpsc::Sender<RegistryMessage>,
}

impl RegistryHandle {
    /// Create new handle
    pub fn new(sender: mpsc::Sender<RegistryMessage>) -> Self {
        Self { sender }
    }

    /// Create a new pending ride
    pub async fn create_ride(
        &self,
        caller: CallerId,
        pickup: Location,
        dropoff: Location,
        price: Decimal,
    ) -> Result<Ride> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(RegistryMessage::CreateRide {
                caller,
                pickup,
                dropoff,
                price,
                response: tx,
            })
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;

        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))?
    }

    /// Look up a ride
    pub async fn get_ride(&self, id: RideId) -> Result<Option<Ride>> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(RegistryMessage::GetRide { id, response: tx })
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;

        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))
    }

    /// List rides requested by a passenger
    pub async fn passenger_rides(&self, caller: CallerId) -> Result<Vec<Ride>> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(RegistryMessage::PassengerRides {
                caller,
                response: tx,
            })
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;

        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))
    }

    /// List rides waiting for a driver
    pub async fn available_rides(&self) -> Result<Vec<Ride>> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(RegistryMessage::AvailableRides { response: tx })
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;

        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))
    }

    /// List rides assigned to a driver
    pub async fn driver_rides(&self, caller: CallerId) -> Result<Vec<Ride>> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(RegistryMessage::DriverRides {
                caller,
                response: tx,
            })
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;

        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))
    }

    /// Claim a pending ride
    pub async fn accept_ride(&self, caller: CallerId, id: RideId) -> Result<Ride> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(RegistryMessage::AcceptRide {
                caller,
                id,
                response: tx,
            })
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;

        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))?
    }

    /// Finish an accepted ride
    pub async fn complete_ride(&self, caller: CallerId, id: RideId) -> Result<Ride> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(RegistryMessage::CompleteRide {
                caller,
                id,
                response: tx,
            })
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;

        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))?
    }

    /// Withdraw a pending ride
    pub async fn cancel_ride(&self, caller: CallerId, id: RideId) -> Result<Ride> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(RegistryMessage::CancelRide {
                caller,
                id,
                response: tx,
            })
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;

        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))?
    }

    /// Shutdown actor and wait for its loop to stop
    pub async fn shutdown(&self) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(RegistryMessage::Shutdown { response: tx })
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;

        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))
    }
}

/// Spawn the registry actor
pub fn spawn_registry_actor(registry: Arc<RideRegistry>) -> RegistryHandle {
    let (tx, rx) = mpsc::channel(1000); // Bounded channel for backpressure
    let actor = RegistryActor::new(registry, rx);

    tokio::spawn(async move {
        actor.run().await;
    });

    RegistryHandle::new(tx)
}
