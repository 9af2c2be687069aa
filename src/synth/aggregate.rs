//! Files aggregating every table: the data context and the query, mutation
//! and subscription roots.

use super::api::input_properties;
use super::{Collection, Context, EntityModel, member_selector};
use crate::emit::CodeBuilder;
use crate::error::Result;

fn open_file(cb: &mut CodeBuilder, ctx: &Context<'_>, usings: &[&str]) {
    for using in usings {
        cb.append_fmt(format_args!("using {using};"));
    }
    cb.append_fmt(format_args!("using {}.Data;", ctx.namespace()));
    cb.append_fmt(format_args!("using {}.Models;", ctx.namespace()));
    cb.append_blank();
}

/// Entity sets for every generated table and view, plus the relationship
/// declarations derived from the lookup lists.
pub(super) fn write_data_context(ctx: &Context<'_>) -> Result<String> {
    let mut cb = CodeBuilder::new();
    cb.append_line("using System.Threading;");
    cb.append_line("using System.Threading.Tasks;");
    cb.append_fmt(format_args!("using {}.Models;", ctx.namespace()));
    cb.append_blank();

    {
        let mut ns = cb.begin_brace(&format!("namespace {}.Data", ctx.namespace()));
        {
            let mut interface = ns.begin_scope(
                "public interface IDataContext",
                Some("Entity sets available to resolvers and mutations."),
            );
            for model in ctx.models {
                interface.append_fmt(format_args!(
                    "EntitySet<{}> {} {{ get; }}",
                    model.class, model.set_name
                ));
            }
            interface.append_blank();
            interface.append_line("Task<int> SaveChangesAsync(CancellationToken cancellationToken);");
        }
        ns.append_blank();

        let mut class = ns.begin_scope(
            "public partial class DataContext : IDataContext",
            Some("The data context and its relationship configuration."),
        );
        for model in ctx.models {
            class.append_property(&format!("EntitySet<{}>", model.class), &model.set_name);
        }

        let relationships = relationships(ctx);
        let mut configure =
            class.begin_brace("protected void ConfigureRelationships(RelationshipBuilder builder)");
        for (i, (parent, collection)) in relationships.iter().enumerate() {
            if i > 0 {
                configure.append_blank();
            }
            configure.append_fmt(format_args!("builder.Entity<{}>()", parent.class));
            configure.append_fmt(format_args!("    .HasMany(x => x.{})", collection.name));
            configure.append_fmt(format_args!("    .WithOne(x => x.{})", collection.inverse));
            configure.append_fmt(format_args!(
                "    .HasForeignKey({});",
                member_selector("x", &collection.foreign_keys)
            ));
        }
    }
    cb.finish()
}

/// Parent collections in lookup order: ambiguous keys first, then the
/// conventional reverse associations.
fn relationships<'c>(ctx: &Context<'c>) -> Vec<(&'c EntityModel<'c>, &'c Collection)> {
    let mut found = Vec::new();
    for lookup in ctx.lookups.ambiguous() {
        let Some(parent) = ctx.model(&lookup.refers_to_table) else {
            continue;
        };
        if let Some(collection) = parent
            .collections
            .iter()
            .find(|c| c.ambiguous && c.child_table == lookup.table_name && c.column == lookup.column)
        {
            found.push((parent, collection));
        }
    }
    for lookup in ctx.lookups.reverse() {
        let Some(parent) = ctx.model(&lookup.parent_table) else {
            continue;
        };
        if let Some(collection) = parent
            .collections
            .iter()
            .find(|c| !c.ambiguous && c.child_table == lookup.child_table)
        {
            found.push((parent, collection));
        }
    }
    found
}

pub(super) fn write_query(ctx: &Context<'_>) -> Result<String> {
    let mut cb = CodeBuilder::new();
    open_file(&mut cb, ctx, &["System.Linq"]);

    {
        let mut ns = cb.begin_brace(&format!("namespace {}", ctx.namespace()));
        let mut query = ns.begin_scope("public class Query", Some("Represents the queries available."));
        for (i, model) in ctx.tables().enumerate() {
            if i > 0 {
                query.append_blank();
            }
            query.append_doc_comment(&format!("Gets the queryable {}.", model.set_name));
            let mut method = query.begin_brace(&format!(
                "public IQueryable<{}> Get{}(IDataContext context)",
                model.class, model.set_name
            ));
            method.append_fmt(format_args!("return context.{};", model.set_name));
        }
    }
    cb.finish()
}

pub(super) fn write_mutation(ctx: &Context<'_>) -> Result<String> {
    let api = format!("{}.Api", ctx.namespace());
    let mut cb = CodeBuilder::new();
    open_file(
        &mut cb,
        ctx,
        &["System.Threading", "System.Threading.Tasks", api.as_str()],
    );

    {
        let mut ns = cb.begin_brace(&format!("namespace {}", ctx.namespace()));
        let mut mutation =
            ns.begin_scope("public class Mutation", Some("Represents the mutations available."));
        for (i, model) in ctx.tables().enumerate() {
            if i > 0 {
                mutation.append_blank();
            }
            write_add_method(&mut mutation, model);
        }
    }
    cb.finish()
}

fn write_add_method(cb: &mut CodeBuilder, model: &EntityModel<'_>) {
    let class = &model.class;
    let var = model.variable();

    cb.append_doc_comment(&format!("Adds a {class} based on the input."));
    let mut method = cb.begin_brace(&format!(
        "public async Task<Add{class}Payload> Add{class}Async(Add{class}Input input, IDataContext context, ITopicEventSender eventSender, CancellationToken cancellationToken)"
    ));
    {
        let mut init = method.begin_initializer(&format!("var {var} = new {class}"));
        for property in input_properties(model) {
            init.append_fmt(format_args!("{0} = input.{0},", property.name));
        }
    }
    method.append_blank();
    method.append_fmt(format_args!("context.{}.Add({var});", model.set_name));
    method.append_line("await context.SaveChangesAsync(cancellationToken);");
    method.append_fmt(format_args!(
        "await eventSender.SendAsync(nameof(Subscription.On{class}Added), {var}, cancellationToken);"
    ));
    method.append_blank();
    method.append_fmt(format_args!("return new Add{class}Payload({var});"));
}

pub(super) fn write_subscription(ctx: &Context<'_>) -> Result<String> {
    let mut cb = CodeBuilder::new();
    open_file(&mut cb, ctx, &[]);

    {
        let mut ns = cb.begin_brace(&format!("namespace {}", ctx.namespace()));
        let mut subscription = ns.begin_scope(
            "public class Subscription",
            Some("Represents the subscriptions available."),
        );
        for (i, model) in ctx.tables().enumerate() {
            if i > 0 {
                subscription.append_blank();
            }
            let class = &model.class;
            let var = model.variable();
            subscription.append_doc_comment(&format!("Raised when a {class} has been added."));
            subscription.append_line("[Subscribe]");
            subscription.append_line("[Topic]");
            let mut method = subscription.begin_brace(&format!(
                "public {class} On{class}Added([EventMessage] {class} {var})"
            ));
            method.append_fmt(format_args!("return {var};"));
        }
    }
    cb.finish()
}
