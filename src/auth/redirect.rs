//! Login redirect side effect triggered when the auth session cannot be recovered.

/// Navigation hook invoked once per failed refresh.
pub trait LoginRedirect
where
	Self: Send + Sync,
{
	/// Sends the user (or the embedding application) to `path`.
	fn redirect_to_login(&self, path: &str);
}

/// Redirect that only records the event in the trace log.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogOnlyRedirect;
impl LoginRedirect for LogOnlyRedirect {
	fn redirect_to_login(&self, path: &str) {
		#[cfg(feature = "tracing")]
		tracing::warn!(path, "Auth session expired; login redirect requested.");
		#[cfg(not(feature = "tracing"))]
		let _ = path;
	}
}
