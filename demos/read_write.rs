use anyhow::{bail, Result};
use rand::{rngs::SmallRng, Rng, SeedableRng};
use std::{
    fs::File,
    io::{BufReader, BufWriter},
    sync::Arc,
};

use binvcf::{
    format_record, Category, KeyDictionary, RecordBuilder, Value, VariantReader, VariantRecord,
    VariantWriterBuilder,
};

const HEADER: &str = "##fileformat=VCFv4.3
##FILTER=<ID=q10,Description=\"Quality below 10\">
##INFO=<ID=DP,Number=1,Type=Integer,Description=\"Total depth\">
##INFO=<ID=AF,Number=A,Type=Float,Description=\"Allele frequency\">
##FORMAT=<ID=GT,Number=1,Type=String,Description=\"Genotype\">
##FORMAT=<ID=DP,Number=1,Type=Integer,Description=\"Read depth\">
##contig=<ID=chr1,length=248956422>
##contig=<ID=chr2,length=242193529>
#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tNA001\tNA002\tNA003
";

const GENOTYPES: [&str; 5] = ["0/0", "0/1", "1/1", "0|1", "./."];

fn random_record(rng: &mut SmallRng, dict: &KeyDictionary, pos: i32) -> Result<VariantRecord> {
    let depths: Vec<Vec<i32>> = (0..3).map(|_| vec![rng.random_range(0..60)]).collect();
    let genotypes: Vec<&str> = (0..3)
        .map(|_| GENOTYPES[rng.random_range(0..GENOTYPES.len())])
        .collect();
    let qual: f32 = rng.random_range(0.0..99.0);
    let mut builder = RecordBuilder::default()
        .contig(if rng.random_bool(0.5) { "chr1" } else { "chr2" })
        .pos(pos)
        .qual(qual)
        .alleles("A", &["G"])
        .info_ints("DP", &[depths.iter().map(|d| d[0]).sum::<i32>()])
        .info_floats("AF", &[rng.random_range(0.0..1.0)])
        .genotypes(&genotypes)
        .format_ints("DP", &depths);
    if qual < 10.0 {
        builder = builder.filter("q10");
    }
    Ok(builder.build(dict)?)
}

fn read_write(path: &str, num_records: usize) -> Result<()> {
    let dict = Arc::new(KeyDictionary::from_text(HEADER)?);
    let mut rng = SmallRng::seed_from_u64(42);

    // Write the binary stream
    let out_handle = File::create(path).map(BufWriter::new)?;
    let mut writer = VariantWriterBuilder::default()
        .header(dict.clone())
        .build(out_handle)?;
    let mut all_records = Vec::with_capacity(num_records);
    for i in 0..num_records {
        let record = random_record(&mut rng, &dict, (i as i32) * 100)?;
        writer.write_record(&record)?;
        all_records.push(record);
    }
    writer.close()?;
    eprintln!(
        "Finished writing {} records to path: {}",
        writer.n_records(),
        path
    );

    // Read the binary stream back, reusing a single record
    let in_handle = File::open(path).map(BufReader::new)?;
    let mut reader = VariantReader::new(in_handle);
    let header = reader.read_header()?;
    let dp = header.id_in(Category::Info, "DP")?;
    let mut record = VariantRecord::new();
    let mut num_records_read = 0;
    let mut total_depth = 0;
    while reader.read_record(&mut record)? {
        if record.buffer() != all_records[num_records_read].buffer() {
            bail!("record {num_records_read} does not match what was written");
        }
        if let Some(field) = record.info(dp)? {
            if let Value::Int(values) = field.value()? {
                total_depth += values.iter().map(|&v| i64::from(v)).sum::<i64>();
            }
        }
        if num_records_read < 3 {
            println!("{}", format_record(&header, &record)?);
        }
        num_records_read += 1;
    }
    eprintln!("Finished reading {num_records_read} records");
    eprintln!("Total INFO depth: {total_depth}");
    eprintln!(
        "Difference in total records: {}",
        all_records.len() - num_records_read
    );

    Ok(())
}

fn main() -> Result<()> {
    let path = std::env::temp_dir().join("binvcf_read_write.bcf");
    let path = path.to_str().unwrap_or("./binvcf_read_write.bcf").to_string();
    read_write(&path, 1000)?;
    std::fs::remove_file(&path)?;
    Ok(())
}
