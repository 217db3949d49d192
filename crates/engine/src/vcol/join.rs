// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use lume_catalog::VirtualColumnDef;
use lume_sql::{Join, Scope, Sql, SqlCompiler, qualified};
use tracing::{instrument, trace};

/// `ON` condition for a foreign key whose target is a virtual column: the
/// target expression evaluated in the joined table against the foreign key
/// value. Without correlated access the join matches nothing.
#[instrument(name = "vcol::join", level = "trace", skip(compiler, def, join), fields(alias = %join.alias, target = %def.name()))]
pub fn compile_join_condition(
	compiler: &SqlCompiler<'_>,
	def: &VirtualColumnDef,
	join: &Join,
) -> lume_type::Result<Sql> {
	if !def.allow_correlated() && compiler.query().entity().name() != def.owner() {
		trace!("correlated access denied, join matches nothing");
		return Ok(Sql::new("NULL"));
	}

	let scope = Scope::new(join.alias.clone(), join.entity.clone());
	let mut sql = compiler.compile_virtual_column(def, &scope)?.parenthesized();
	sql.push(&format!(" = {}", qualified(&join.parent_alias, &join.field.name)));
	Ok(sql)
}
