mod notifier;

pub use notifier::{ChangeNotifier, NotifierStats, StateChange, SubscriptionId};
