use crate::Config;

/// A component that needs configuration before it can run.
///
/// The surrounding application fetches a [`Config`] from a store and hands it
/// to every service through [`Service::init`].
pub trait Service {
    type Error;

    fn init(&mut self, config: &Config) -> Result<(), Self::Error>;
}
