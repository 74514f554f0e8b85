use std::process::ExitCode;
use std::str::FromStr;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{ArgAction, Args, Parser, Subcommand};
use procurement_records::{
    config::{self, AppConfig},
    models::{
        Amounts, GoodsReceipt, ItemMaster, ItemStatus, OrderLine, PurchaseOrder,
        PurchaseOrderStatus, ReceiptLine, ReceiptStatus, Record, VENDORS,
    },
    services::{compute_totals, line_total, Totals},
    RecordController, RecordService, ServiceError,
};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

fn main() -> ExitCode {
    let cli = Cli::parse();
    let json = cli.json;

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report_error(&err, json);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = load_settings()?;

    // Pure arithmetic and catalog lookups need no storage.
    match &cli.command {
        Commands::Totals(args) => return handle_totals(&config, args, cli.json),
        Commands::Vendors => return handle_vendors(cli.json),
        _ => {}
    }

    let context = CliContext::open(config)?;
    match cli.command {
        Commands::Items(command) => handle_items_command(&context, command, cli.json),
        Commands::Orders(command) => handle_orders_command(&context, command, cli.json),
        Commands::Receipts(command) => handle_receipts_command(&context, command, cli.json),
        Commands::Seed => handle_seed(&context, cli.json),
        Commands::Totals(_) | Commands::Vendors => Ok(()),
    }
}

#[derive(Parser)]
#[command(
    name = "procurement-cli",
    about = "Manage item master, purchase order and goods receipt records",
    version
)]
struct Cli {
    #[arg(
        long,
        global = true,
        action = ArgAction::SetTrue,
        help = "Render command output as pretty JSON"
    )]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(subcommand)]
    Items(ItemsCommands),
    #[command(subcommand)]
    Orders(OrdersCommands),
    #[command(subcommand)]
    Receipts(ReceiptsCommands),
    /// Compute totals for ad-hoc lines without storing anything
    Totals(TotalsArgs),
    /// List the vendor catalog
    Vendors,
    /// Write sample records into record types that have never been saved
    Seed,
}

#[derive(Subcommand)]
enum ItemsCommands {
    List(ListArgs),
    Show(IdArgs),
    Create(CreateItemArgs),
    Delete(IdArgs),
    Clear,
}

#[derive(Subcommand)]
enum OrdersCommands {
    List(ListArgs),
    Show(IdArgs),
    Create(CreateOrderArgs),
    Delete(IdArgs),
    Clear,
}

#[derive(Subcommand)]
enum ReceiptsCommands {
    List(ListArgs),
    Show(IdArgs),
    Create(CreateReceiptArgs),
    Delete(IdArgs),
    Clear,
}

#[derive(Args)]
struct ListArgs {
    #[arg(long, help = "Case-insensitive text matched against identifying fields")]
    filter: Option<String>,
}

#[derive(Args)]
struct IdArgs {
    #[arg(help = "Record identifier")]
    id: String,
}

#[derive(Args)]
struct CreateItemArgs {
    #[arg(long, help = "Item code; generated when omitted")]
    code: Option<String>,
    #[arg(long, help = "Item description")]
    description: String,
    #[arg(long, help = "Item category")]
    category: String,
    #[arg(long, help = "Unit of measure (e.g. Each, Box)")]
    uom: String,
    #[arg(long, value_parser = parse_decimal, default_value = "0", help = "Unit price")]
    price: Decimal,
    #[arg(long, value_parser = parse_decimal, default_value = "0", help = "Tax percentage (5 = 5%)")]
    tax: Decimal,
    #[arg(long, value_parser = parse_decimal, default_value = "0", help = "Reorder level")]
    reorder_level: Decimal,
    #[arg(long, value_parser = parse_decimal, default_value = "0", help = "Reorder quantity")]
    reorder_quantity: Decimal,
    #[arg(long)]
    brand: Option<String>,
    #[arg(long)]
    model: Option<String>,
    #[arg(long)]
    barcode: Option<String>,
    #[arg(long)]
    supplier: Option<String>,
    #[arg(long)]
    notes: Option<String>,
    #[arg(long, action = ArgAction::SetTrue, help = "Create the item as inactive")]
    inactive: bool,
}

#[derive(Args)]
struct CreateOrderArgs {
    #[arg(long, default_value = "v-001", help = "Vendor identifier (see `vendors`)")]
    vendor: String,
    #[arg(long, value_parser = parse_date, help = "Order date (YYYY-MM-DD); defaults to today")]
    order_date: Option<NaiveDate>,
    #[arg(long, value_parser = parse_date, help = "Expected delivery date (YYYY-MM-DD)")]
    expected_date: Option<NaiveDate>,
    #[arg(long)]
    billing_address: Option<String>,
    #[arg(long)]
    shipping_address: Option<String>,
    #[arg(
        long = "line",
        value_parser = parse_order_line,
        action = ArgAction::Append,
        help = "Order line as description:qty:price:tax[:sku] (e.g. \"Paper A4:2:5.5:5:SKU-101\")"
    )]
    lines: Vec<OrderLine>,
    #[arg(long, value_parser = parse_decimal, default_value = "0", help = "Flat shipping fee")]
    shipping_fee: Decimal,
    #[arg(long)]
    notes: Option<String>,
    #[arg(long, value_parser = parse_order_status, help = "Draft, Approved or Cancelled")]
    status: Option<PurchaseOrderStatus>,
}

#[derive(Args)]
struct CreateReceiptArgs {
    #[arg(long = "po", help = "Purchase order number being received")]
    po_number: String,
    #[arg(long, help = "Supplier name")]
    supplier: String,
    #[arg(long, value_parser = parse_date, help = "Receipt date (YYYY-MM-DD); defaults to today")]
    date: Option<NaiveDate>,
    #[arg(
        long = "line",
        value_parser = parse_receipt_line,
        action = ArgAction::Append,
        help = "Receipt line as description:accepted:rejected:price:tax"
    )]
    lines: Vec<ReceiptLine>,
    #[arg(long, value_parser = parse_decimal, default_value = "0", help = "Shipping charged on the receipt")]
    shipping_fee: Decimal,
    #[arg(long, help = "Notes on the additional charges")]
    charge_notes: Option<String>,
    #[arg(long)]
    description: Option<String>,
    #[arg(long)]
    billing_address: Option<String>,
    #[arg(long)]
    shipping_address: Option<String>,
    #[arg(long, value_parser = parse_receipt_status, help = "Pending, Received, Partially Received or Rejected")]
    status: Option<ReceiptStatus>,
}

#[derive(Args)]
struct TotalsArgs {
    #[arg(
        long = "line",
        value_parser = parse_amounts,
        action = ArgAction::Append,
        help = "Line as qty:price:tax (e.g. 2:5.5:5)"
    )]
    lines: Vec<Amounts>,
    #[arg(long, value_parser = parse_decimal, default_value = "0", help = "Flat shipping fee")]
    shipping_fee: Decimal,
    #[arg(long, help = "Currency symbol for plain output; defaults to the configured symbol")]
    currency: Option<String>,
}

impl TotalsArgs {
    fn currency_symbol<'a>(&'a self, config: &'a AppConfig) -> &'a str {
        self.currency.as_deref().unwrap_or(&config.currency_symbol)
    }
}

#[derive(Serialize)]
struct RecordView<'a, R> {
    #[serde(flatten)]
    record: &'a R,
    #[serde(skip_serializing_if = "Option::is_none")]
    totals: Option<Totals>,
}

#[derive(Serialize)]
struct DeleteOutput<'a> {
    id: &'a str,
    deleted: bool,
}

struct CliContext {
    config: AppConfig,
    service: RecordService,
}

fn load_settings() -> Result<AppConfig> {
    let config = config::load_config().context("failed to load application config")?;
    config::init_tracing(config.log_level(), config.log_json);
    if config.is_development() {
        debug!(environment = %config.environment, "running with development settings");
    }
    Ok(config)
}

impl CliContext {
    fn open(config: AppConfig) -> Result<Self> {
        let service =
            RecordService::from_config(&config).context("failed to open record storage")?;
        debug!(backend = %config.storage().backend, "storage ready");

        Ok(Self { config, service })
    }

    fn controller<R: Record>(&self) -> RecordController<R> {
        RecordController::new(self.service.clone())
    }

    fn money(&self) -> Money<'_> {
        Money(&self.config.currency_symbol)
    }
}

/// Formats amounts as symbol plus two decimals.
struct Money<'a>(&'a str);

impl Money<'_> {
    fn format(&self, value: Decimal) -> String {
        format!("{}{:.2}", self.0, value.round_dp(2))
    }

    /// Amounts whose arithmetic overflowed have no value to show.
    fn format_checked(&self, value: Option<Decimal>) -> String {
        value
            .map(|value| self.format(value))
            .unwrap_or_else(|| "n/a".to_string())
    }
}

/// Plain-text rendering of a record.
trait Render: Record {
    fn headline(&self, money: &Money<'_>) -> String;

    fn details(&self, _money: &Money<'_>) -> Vec<String> {
        Vec::new()
    }
}

impl Render for ItemMaster {
    fn headline(&self, money: &Money<'_>) -> String {
        format!(
            "- {} • {} • {} • {} per {} • {}",
            self.item_code,
            self.description,
            self.category,
            money.format(self.price),
            self.unit_of_measure,
            self.status
        )
    }

    fn details(&self, _money: &Money<'_>) -> Vec<String> {
        vec![
            format!("  brand {} / model {} / barcode {}", self.brand, self.model, self.barcode),
            format!(
                "  reorder at {} (qty {}) • tax {}% • supplier {}",
                self.reorder_level, self.reorder_quantity, self.tax_percent, self.supplier
            ),
        ]
    }
}

impl Render for PurchaseOrder {
    fn headline(&self, money: &Money<'_>) -> String {
        let total = self.totals().map(|t| t.grand_total);
        format!(
            "- {} • {} • {} • {} item(s) • {} • {}",
            self.po_number,
            self.vendor_name,
            self.order_date.map(|d| d.to_string()).unwrap_or_default(),
            self.item_count(),
            money.format_checked(total),
            self.status
        )
    }

    fn details(&self, money: &Money<'_>) -> Vec<String> {
        self.items
            .iter()
            .map(|line| {
                format!(
                    "  • {} {} x {} @ {} +{}% = {}",
                    line.sku,
                    line.quantity,
                    line.description,
                    money.format(line.unit_price),
                    line.tax_percent,
                    money.format_checked(line_total(line))
                )
            })
            .collect()
    }
}

impl Render for GoodsReceipt {
    fn headline(&self, money: &Money<'_>) -> String {
        let total = self.totals().map(|t| t.grand_total);
        format!(
            "- {} • PO {} • {} • {} • {} • {}",
            self.gr_number,
            self.po_number,
            self.supplier,
            self.receipt_date.map(|d| d.to_string()).unwrap_or_default(),
            money.format_checked(total),
            self.status
        )
    }

    fn details(&self, money: &Money<'_>) -> Vec<String> {
        let mut lines: Vec<String> = self
            .items
            .iter()
            .map(|line| {
                format!(
                    "  • {} accepted {} rejected {} @ {} +{}% = {}",
                    line.description,
                    line.quantity_accepted,
                    line.quantity_rejected,
                    money.format(line.unit_price),
                    line.tax_percent,
                    money.format_checked(line_total(line))
                )
            })
            .collect();
        if !self.other_charges.notes.is_empty() {
            lines.push(format!("  charges note: {}", self.other_charges.notes));
        }
        lines
    }
}

fn handle_items_command(context: &CliContext, command: ItemsCommands, json: bool) -> Result<()> {
    match command {
        ItemsCommands::List(args) => handle_list::<ItemMaster>(context, args, json),
        ItemsCommands::Show(args) => handle_show::<ItemMaster>(context, &args.id, json),
        ItemsCommands::Create(args) => handle_create_item(context, args, json),
        ItemsCommands::Delete(args) => handle_delete::<ItemMaster>(context, &args.id, json),
        ItemsCommands::Clear => handle_clear::<ItemMaster>(context, json),
    }
}

fn handle_orders_command(context: &CliContext, command: OrdersCommands, json: bool) -> Result<()> {
    match command {
        OrdersCommands::List(args) => handle_list::<PurchaseOrder>(context, args, json),
        OrdersCommands::Show(args) => handle_show::<PurchaseOrder>(context, &args.id, json),
        OrdersCommands::Create(args) => handle_create_order(context, args, json),
        OrdersCommands::Delete(args) => handle_delete::<PurchaseOrder>(context, &args.id, json),
        OrdersCommands::Clear => handle_clear::<PurchaseOrder>(context, json),
    }
}

fn handle_receipts_command(
    context: &CliContext,
    command: ReceiptsCommands,
    json: bool,
) -> Result<()> {
    match command {
        ReceiptsCommands::List(args) => handle_list::<GoodsReceipt>(context, args, json),
        ReceiptsCommands::Show(args) => handle_show::<GoodsReceipt>(context, &args.id, json),
        ReceiptsCommands::Create(args) => handle_create_receipt(context, args, json),
        ReceiptsCommands::Delete(args) => handle_delete::<GoodsReceipt>(context, &args.id, json),
        ReceiptsCommands::Clear => handle_clear::<GoodsReceipt>(context, json),
    }
}

fn handle_list<R: Render>(context: &CliContext, args: ListArgs, json: bool) -> Result<()> {
    let mut controller = context.controller::<R>();
    controller.set_filter(args.filter.unwrap_or_default());
    let records = controller.visible_records();

    if json {
        return print_json(&records);
    }

    println!("{} {} record(s)", records.len(), R::KIND.label());
    let money = context.money();
    for record in &records {
        println!(
            "{} (id {})",
            record.headline(&money),
            record.id().unwrap_or("-")
        );
    }
    Ok(())
}

fn handle_show<R: Render>(context: &CliContext, id: &str, json: bool) -> Result<()> {
    let record = context
        .service
        .get::<R>(id)
        .with_context(|| format!("failed to load {} {}", R::KIND.label(), id))?;
    print_record(context, &record, json)
}

fn handle_delete<R: Record>(context: &CliContext, id: &str, json: bool) -> Result<()> {
    let deleted = context
        .controller::<R>()
        .delete(id)
        .with_context(|| format!("failed to delete {} {}", R::KIND.label(), id))?;

    if json {
        return print_json(&DeleteOutput { id, deleted });
    }
    if deleted {
        println!("Deleted {} {}", R::KIND.label(), id);
    } else {
        println!("No {} with id {}", R::KIND.label(), id);
    }
    Ok(())
}

fn handle_clear<R: Record>(context: &CliContext, json: bool) -> Result<()> {
    context
        .service
        .clear::<R>()
        .with_context(|| format!("failed to clear {} records", R::KIND.label()))?;

    if json {
        return print_json(&serde_json::json!({ "cleared": R::KIND }));
    }
    println!("Cleared all {} records", R::KIND.label());
    Ok(())
}

fn handle_create_item(context: &CliContext, args: CreateItemArgs, json: bool) -> Result<()> {
    let mut controller = context.controller::<ItemMaster>();
    let draft = controller.create()?;

    if let Some(code) = normalize_optional_string(args.code) {
        draft.item_code = code;
    }
    draft.description = normalize_string(args.description);
    draft.category = normalize_string(args.category);
    draft.unit_of_measure = normalize_string(args.uom);
    draft.price = args.price;
    draft.tax_percent = args.tax;
    draft.reorder_level = args.reorder_level;
    draft.reorder_quantity = args.reorder_quantity;
    draft.brand = args.brand.map(normalize_string).unwrap_or_default();
    draft.model = args.model.map(normalize_string).unwrap_or_default();
    draft.barcode = args.barcode.map(normalize_string).unwrap_or_default();
    draft.supplier = args.supplier.map(normalize_string).unwrap_or_default();
    draft.notes = args.notes.unwrap_or_default();
    if args.inactive {
        draft.status = ItemStatus::Inactive;
    }

    let saved = controller.save()?;
    print_record(context, &saved, json)
}

fn handle_create_order(context: &CliContext, args: CreateOrderArgs, json: bool) -> Result<()> {
    let mut controller = context.controller::<PurchaseOrder>();
    let draft = controller.create()?;

    draft.select_vendor(args.vendor.trim());
    if let Some(date) = args.order_date {
        draft.order_date = Some(date);
    }
    draft.expected_date = args.expected_date;
    draft.billing_address = args.billing_address.unwrap_or_default();
    draft.shipping_address = args.shipping_address.unwrap_or_default();
    draft.items = args.lines;
    draft.shipping_fee = args.shipping_fee;
    draft.notes = args.notes.unwrap_or_default();
    if let Some(status) = args.status {
        draft.status = status;
    }

    let saved = controller.save()?;
    print_record(context, &saved, json)
}

fn handle_create_receipt(context: &CliContext, args: CreateReceiptArgs, json: bool) -> Result<()> {
    let mut controller = context.controller::<GoodsReceipt>();
    let draft = controller.create()?;

    draft.po_number = normalize_string(args.po_number);
    draft.supplier = normalize_string(args.supplier);
    if let Some(date) = args.date {
        draft.receipt_date = Some(date);
    }
    draft.items = args.lines;
    draft.other_charges.shipping_fee = args.shipping_fee;
    draft.other_charges.notes = args.charge_notes.unwrap_or_default();
    draft.description = args.description.unwrap_or_default();
    draft.billing_address = args.billing_address.unwrap_or_default();
    draft.shipping_address = args.shipping_address.unwrap_or_default();
    if let Some(status) = args.status {
        draft.status = status;
    }

    let saved = controller.save()?;
    print_record(context, &saved, json)
}

fn handle_totals(config: &AppConfig, args: &TotalsArgs, json: bool) -> Result<()> {
    let totals = compute_totals(&args.lines, args.shipping_fee)
        .context("amounts are too large to total")?;
    if json {
        return print_json(&totals);
    }

    let money = Money(args.currency_symbol(config));
    for line in &args.lines {
        println!(
            "  • {} @ {} +{}% = {}",
            line.quantity,
            money.format(line.unit_price),
            line.tax_percent,
            money.format_checked(line_total(line))
        );
    }
    render_totals(&money, &totals);
    Ok(())
}

fn handle_vendors(json: bool) -> Result<()> {
    if json {
        return print_json(&VENDORS);
    }
    for vendor in VENDORS {
        println!("- {} • {}", vendor.id, vendor.name);
    }
    Ok(())
}

fn handle_seed(context: &CliContext, json: bool) -> Result<()> {
    let seeded = context
        .service
        .seed_samples()
        .context("failed to seed sample records")?;

    if json {
        return print_json(&serde_json::json!({ "seeded": seeded }));
    }
    println!("Seeded {} record type(s) with sample data", seeded);
    Ok(())
}

fn print_record<R: Render>(context: &CliContext, record: &R, json: bool) -> Result<()> {
    if json {
        return print_json(&RecordView {
            record,
            totals: record.totals(),
        });
    }

    let money = context.money();
    println!("{}", record.headline(&money));
    println!("  id {}", record.id().unwrap_or("-"));
    for line in record.details(&money) {
        println!("{}", line);
    }
    if let Some(totals) = record.totals() {
        render_totals(&money, &totals);
    }
    Ok(())
}

fn render_totals(money: &Money<'_>, totals: &Totals) {
    println!("  Subtotal:    {}", money.format(totals.subtotal));
    println!("  Tax:         {}", money.format(totals.tax_total));
    println!("  Shipping:    {}", money.format(totals.shipping_fee));
    println!("  Grand total: {}", money.format(totals.grand_total));
}

fn report_error(err: &anyhow::Error, json: bool) {
    let field_errors = err
        .downcast_ref::<ServiceError>()
        .and_then(ServiceError::field_errors);

    match (field_errors, json) {
        (Some(fields), true) => {
            let _ = print_json(&serde_json::json!({ "errors": fields }));
        }
        (Some(fields), false) => {
            eprintln!("Validation failed:");
            for (field, message) in fields.iter() {
                eprintln!("  {}: {}", field, message);
            }
        }
        (None, _) => eprintln!("error: {:#}", err),
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn normalize_string(value: String) -> String {
    value.trim().to_string()
}

fn normalize_optional_string(value: Option<String>) -> Option<String> {
    value
        .map(normalize_string)
        .filter(|trimmed| !trimmed.is_empty())
}

fn parse_decimal(raw: &str) -> Result<Decimal, String> {
    Decimal::from_str(raw.trim()).map_err(|_| format!("invalid decimal '{raw}'"))
}

fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| format!("invalid date '{raw}', expected YYYY-MM-DD"))
}

fn parse_order_status(raw: &str) -> Result<PurchaseOrderStatus, String> {
    PurchaseOrderStatus::from_str(raw.trim()).map_err(|_| format!("unknown order status '{raw}'"))
}

fn parse_receipt_status(raw: &str) -> Result<ReceiptStatus, String> {
    ReceiptStatus::from_str(raw.trim()).map_err(|_| format!("unknown receipt status '{raw}'"))
}

fn split_fields(raw: &str, min: usize, max: usize, shape: &str) -> Result<Vec<String>, String> {
    let parts: Vec<String> = raw.split(':').map(|part| part.trim().to_string()).collect();
    if parts.len() < min || parts.len() > max {
        return Err(format!("invalid line '{raw}', expected {shape}"));
    }
    Ok(parts)
}

fn parse_order_line(raw: &str) -> Result<OrderLine, String> {
    let parts = split_fields(raw, 4, 5, "description:qty:price:tax[:sku]")?;
    let line = OrderLine::new(
        parts[0].clone(),
        parse_decimal(&parts[1])?,
        parse_decimal(&parts[2])?,
        parse_decimal(&parts[3])?,
    );
    Ok(match parts.get(4) {
        Some(sku) => line.with_sku(sku.clone()),
        None => line,
    })
}

fn parse_receipt_line(raw: &str) -> Result<ReceiptLine, String> {
    let parts = split_fields(raw, 5, 5, "description:accepted:rejected:price:tax")?;
    Ok(ReceiptLine::new(
        parts[0].clone(),
        parse_decimal(&parts[1])?,
        parse_decimal(&parts[2])?,
        parse_decimal(&parts[3])?,
        parse_decimal(&parts[4])?,
    ))
}

fn parse_amounts(raw: &str) -> Result<Amounts, String> {
    let parts = split_fields(raw, 3, 3, "qty:price:tax")?;
    Ok(Amounts::new(
        parse_decimal(&parts[0])?,
        parse_decimal(&parts[1])?,
        parse_decimal(&parts[2])?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use procurement_records::StorageConfig;

    fn totals_args(argv: &[&str]) -> TotalsArgs {
        match Cli::try_parse_from(argv).unwrap().command {
            Commands::Totals(args) => args,
            _ => panic!("expected the totals command"),
        }
    }

    #[test]
    fn totals_currency_follows_config() {
        let mut config = AppConfig::new("test".into(), StorageConfig::in_memory());
        config.currency_symbol = "€".into();

        let args = totals_args(&["procurement-cli", "totals", "--line", "2:5.5:5"]);
        assert_eq!(args.currency_symbol(&config), "€");

        let args = totals_args(&["procurement-cli", "totals", "--currency", "£"]);
        assert_eq!(args.currency_symbol(&config), "£");
    }

    #[test]
    fn totals_args_parse_lines() {
        let args = totals_args(&[
            "procurement-cli",
            "totals",
            "--line",
            "2:5.5:5",
            "--line",
            "3:8:0",
            "--shipping-fee",
            "25",
        ]);
        let totals = compute_totals(&args.lines, args.shipping_fee).unwrap();
        assert_eq!(totals.grand_total, Decimal::new(6055, 2));
    }

    #[test]
    fn overflowed_amounts_render_as_unavailable() {
        let money = Money("$");
        assert_eq!(money.format_checked(Some(Decimal::new(1055, 1))), "$105.50");
        assert_eq!(money.format_checked(None), "n/a");
    }
}
