use crate::error::ActuatorError;

/// The physical lock, reachable only through these two commands.
///
/// Both must be idempotent: unlocking an unlocked device is harmless. The
/// engine only cares whether a call succeeded.
pub trait Actuator: Send + Sync {
    /// Engage the lock.
    fn lock(&self) -> Result<(), ActuatorError>;

    /// Release the lock.
    fn unlock(&self) -> Result<(), ActuatorError>;
}

impl<T: Actuator + ?Sized> Actuator for &T {
    fn lock(&self) -> Result<(), ActuatorError> {
        (**self).lock()
    }

    fn unlock(&self) -> Result<(), ActuatorError> {
        (**self).unlock()
    }
}

impl<T: Actuator + ?Sized> Actuator for Box<T> {
    fn lock(&self) -> Result<(), ActuatorError> {
        (**self).lock()
    }

    fn unlock(&self) -> Result<(), ActuatorError> {
        (**self).unlock()
    }
}
