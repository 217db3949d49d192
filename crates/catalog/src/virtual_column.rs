// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{
	fmt::{Debug, Formatter},
	sync::Arc,
};

use lume_type::{Expr, Result, Type, Value};
use once_cell::sync::OnceCell;

use crate::record::{Record, RecordMut};

pub type LocalCompute = Arc<dyn Fn(&dyn Record) -> Result<Value> + Send + Sync>;
pub type LocalWrite = Arc<dyn Fn(&mut dyn RecordMut, &Value) -> Result<()> + Send + Sync>;
type ExpressionProducer = Arc<dyn Fn() -> Expr + Send + Sync>;

enum ExpressionSource {
	Expr(Expr),
	Producer(ExpressionProducer),
}

/// Declaration of a virtual column, before it is attached to an entity.
///
/// A virtual column has no storage. Its value comes either from its query
/// expression, evaluated as part of a query, or from `compute` on first
/// access. Without `write` the column is read-only.
pub struct VirtualColumn {
	source: ExpressionSource,
	compute: Option<LocalCompute>,
	write: Option<LocalWrite>,
	auto_include: bool,
	allow_correlated: bool,
}

impl VirtualColumn {
	pub fn new(expression: Expr) -> Self {
		Self::from_source(ExpressionSource::Expr(expression))
	}

	/// The expression is produced on first use. Useful when it refers to
	/// entities declared later.
	pub fn lazy(producer: impl Fn() -> Expr + Send + Sync + 'static) -> Self {
		Self::from_source(ExpressionSource::Producer(Arc::new(producer)))
	}

	fn from_source(source: ExpressionSource) -> Self {
		Self {
			source,
			compute: None,
			write: None,
			auto_include: true,
			allow_correlated: false,
		}
	}

	pub fn compute(mut self, compute: impl Fn(&dyn Record) -> Result<Value> + Send + Sync + 'static) -> Self {
		self.compute = Some(Arc::new(compute));
		self
	}

	pub fn write(
		mut self,
		write: impl Fn(&mut dyn RecordMut, &Value) -> Result<()> + Send + Sync + 'static,
	) -> Self {
		self.write = Some(Arc::new(write));
		self
	}

	/// Whether every query against the owning entity projects the column.
	/// Default: true
	pub fn auto_include(mut self, auto_include: bool) -> Self {
		self.auto_include = auto_include;
		self
	}

	/// Whether the expression may be evaluated when the owning entity is
	/// reached through a join from another entity's query.
	/// Default: false
	pub fn allow_correlated(mut self, allow_correlated: bool) -> Self {
		self.allow_correlated = allow_correlated;
		self
	}

	pub(crate) fn into_def(self, owner: &str, name: &str, ty: Type) -> VirtualColumnDef {
		VirtualColumnDef {
			owner: owner.to_string(),
			name: name.to_string(),
			ty,
			source: self.source,
			resolved: OnceCell::new(),
			compute: self.compute,
			write: self.write,
			auto_include: self.auto_include,
			allow_correlated: self.allow_correlated,
		}
	}
}

/// A virtual column attached to its owning entity.
pub struct VirtualColumnDef {
	owner: String,
	name: String,
	ty: Type,
	source: ExpressionSource,
	resolved: OnceCell<Expr>,
	compute: Option<LocalCompute>,
	write: Option<LocalWrite>,
	auto_include: bool,
	allow_correlated: bool,
}

impl VirtualColumnDef {
	pub fn owner(&self) -> &str {
		&self.owner
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn ty(&self) -> Type {
		self.ty
	}

	pub fn expression(&self) -> &Expr {
		match &self.source {
			ExpressionSource::Expr(expr) => expr,
			ExpressionSource::Producer(producer) => self.resolved.get_or_init(|| producer()),
		}
	}

	pub fn local_compute(&self) -> Option<&LocalCompute> {
		self.compute.as_ref()
	}

	pub fn local_write(&self) -> Option<&LocalWrite> {
		self.write.as_ref()
	}

	pub fn auto_include(&self) -> bool {
		self.auto_include
	}

	pub fn allow_correlated(&self) -> bool {
		self.allow_correlated
	}
}

impl Debug for VirtualColumnDef {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("VirtualColumnDef")
			.field("owner", &self.owner)
			.field("name", &self.name)
			.field("ty", &self.ty)
			.field("compute", &self.compute.is_some())
			.field("write", &self.write.is_some())
			.field("auto_include", &self.auto_include)
			.field("allow_correlated", &self.allow_correlated)
			.finish()
	}
}
