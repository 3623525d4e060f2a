//! Call gating for arbitrary targets.
//!
//! A [`Gate`] pairs a target handle with a shared [`Throttle`] and a [`MemberSet`]. Members
//! are reached through closures naming the member they touch: gated names withdraw exactly
//! one credit first, every other name passes straight through. Arguments, return values,
//! and errors flow through the closure untouched.

// self
use crate::{
	_prelude::*,
	limit::{Throttle, TokenBucket},
};

/// Names of the members whose use costs a credit.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MemberSet(BTreeSet<String>);
impl MemberSet {
	/// Collects member names, ignoring duplicates.
	pub fn new<I>(members: I) -> Self
	where
		I: IntoIterator,
		I::Item: Into<String>,
	{
		Self(members.into_iter().map(Into::into).collect())
	}

	/// Returns `true` when `member` is gated.
	pub fn contains(&self, member: &str) -> bool {
		self.0.contains(member)
	}

	/// Returns `true` when nothing is gated.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Number of gated members.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Iterates over gated member names in sorted order.
	pub fn iter(&self) -> impl Iterator<Item = &str> {
		self.0.iter().map(String::as_str)
	}
}
impl<S> FromIterator<S> for MemberSet
where
	S: Into<String>,
{
	fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
		Self::new(iter)
	}
}

/// Gated view over a target.
///
/// `T` is the handle the gate holds (a reference or an [`Arc`]); the target itself lives
/// wherever the caller keeps it. The limiter is shared, so several gates may draw from the
/// same bucket.
pub struct Gate<T, L = TokenBucket>
where
	L: ?Sized + Throttle,
{
	target: T,
	limiter: Arc<L>,
	members: MemberSet,
}
impl<T, L> Gate<T, L>
where
	L: ?Sized + Throttle,
{
	/// Wraps `target`, gating the listed members behind `limiter`.
	pub fn new<I>(target: T, limiter: Arc<L>, members: I) -> Self
	where
		I: IntoIterator,
		I::Item: Into<String>,
	{
		Self { target, limiter, members: MemberSet::new(members) }
	}

	/// Wrapped handle, for ungated access.
	pub fn target(&self) -> &T {
		&self.target
	}

	/// Shared limiter credits are drawn from.
	pub fn limiter(&self) -> &Arc<L> {
		&self.limiter
	}

	/// Gated member names.
	pub fn members(&self) -> &MemberSet {
		&self.members
	}

	/// Returns `true` when using `member` costs a credit.
	pub fn is_gated(&self, member: &str) -> bool {
		self.members.contains(member)
	}

	/// Calls an async member, awaiting a credit first when `member` is gated.
	pub async fn call<'a, F, Fut>(&'a self, member: &str, f: F) -> Fut::Output
	where
		F: FnOnce(&'a T) -> Fut,
		Fut: Future,
	{
		if self.is_gated(member) {
			self.limiter.acquire(1).await;
		}

		f(&self.target).await
	}

	/// Calls a synchronous member, blocking for a credit first when `member` is gated.
	pub fn invoke<'a, F, R>(&'a self, member: &str, f: F) -> R
	where
		F: FnOnce(&'a T) -> R,
	{
		if self.is_gated(member) {
			self.limiter.acquire_blocking(1);
		}

		f(&self.target)
	}

	/// Reads a data member, blocking for a credit first when `member` is gated.
	pub fn read<'a, F, R>(&'a self, member: &str, f: F) -> R
	where
		F: FnOnce(&'a T) -> R,
	{
		self.invoke(member, f)
	}

	/// Drops the gate and returns the wrapped handle.
	pub fn into_inner(self) -> T {
		self.target
	}
}
impl<T, L> Clone for Gate<T, L>
where
	T: Clone,
	L: ?Sized + Throttle,
{
	fn clone(&self) -> Self {
		Self {
			target: self.target.clone(),
			limiter: Arc::clone(&self.limiter),
			members: self.members.clone(),
		}
	}
}
impl<T, L> Debug for Gate<T, L>
where
	T: Debug,
	L: ?Sized + Throttle,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Gate").field("target", &self.target).field("members", &self.members).finish()
	}
}
